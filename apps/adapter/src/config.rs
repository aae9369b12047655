//! Adapter configuration.
//!
//! There is no config file; everything comes from environment variables:
//! - `LFS_RELAY_TEMP_DIR`: where download temp files are created
//! - `LFS_RELAY_TEMP_PREFIX`: temp file name prefix
//! - `LFS_RELAY_CHUNK_SIZE`: I/O chunk size in bytes

use std::path::PathBuf;

use anyhow::{Context, bail};
use lfs_relay_transfer::{DEFAULT_CHUNK_SIZE, DEFAULT_TEMP_PREFIX};

const TEMP_DIR_VAR: &str = "LFS_RELAY_TEMP_DIR";
const TEMP_PREFIX_VAR: &str = "LFS_RELAY_TEMP_PREFIX";
const CHUNK_SIZE_VAR: &str = "LFS_RELAY_CHUNK_SIZE";

/// Adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory for download temp files.
    pub temp_dir: PathBuf,

    /// Temp file name prefix.
    pub temp_prefix: String,

    /// Read/write chunk size. One progress line is sent per chunk.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            temp_prefix: DEFAULT_TEMP_PREFIX.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }

    /// Builds a config from `(name, value)` pairs. Unknown names are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();

        for (name, value) in vars {
            let value = value.into();
            match name.as_ref() {
                TEMP_DIR_VAR => {
                    if value.is_empty() {
                        bail!("{TEMP_DIR_VAR} is set but empty");
                    }
                    config.temp_dir = PathBuf::from(value);
                }
                TEMP_PREFIX_VAR => {
                    if value.is_empty() {
                        bail!("{TEMP_PREFIX_VAR} is set but empty");
                    }
                    config.temp_prefix = value;
                }
                CHUNK_SIZE_VAR => {
                    let size: usize = value
                        .trim()
                        .parse()
                        .with_context(|| format!("invalid {CHUNK_SIZE_VAR}: {value:?}"))?;
                    if size == 0 {
                        bail!("{CHUNK_SIZE_VAR} must be greater than zero");
                    }
                    config.chunk_size = size;
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
