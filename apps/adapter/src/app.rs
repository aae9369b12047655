//! Wires stdio, HTTP and the temp directory into one session.

use lfs_relay_session::Session;
use lfs_relay_transfer::{ReqwestTransport, TempDirStore, TransferExecutor};
use tokio::io::BufReader;

use crate::config::Config;

/// Runs one session over standard input and output.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let transport = ReqwestTransport::new()?;
    let store = TempDirStore::new(config.temp_dir, config.temp_prefix);
    let executor = TransferExecutor::new(transport, store).with_chunk_size(config.chunk_size);

    let mut session = Session::new(executor, tokio::io::stdout());
    let stats = session
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .inspect_err(|e| tracing::error!(error = %e, "session aborted"))?;

    tracing::debug!(?stats, state = ?session.state(), "adapter exiting");
    Ok(())
}
