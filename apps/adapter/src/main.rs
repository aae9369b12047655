//! LFS custom transfer adapter entry point.
//!
//! Standard output carries protocol lines only; diagnostics go to standard
//! error.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting adapter");

    let config = config::Config::from_env()?;
    tracing::debug!(
        temp_dir = %config.temp_dir.display(),
        temp_prefix = %config.temp_prefix,
        chunk_size = config.chunk_size,
        "configuration loaded"
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(app::run(config))?;

    Ok(())
}
