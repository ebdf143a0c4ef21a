//! Pipeline configuration.
//!
//! The only setting is the storage connection string used for offloading
//! large response bodies. See [`StorageConnection`] for its grammar.

use anyhow::{Context, Result};

use crate::infra::blob::StorageConnection;

/// Environment variable holding the storage connection string.
pub const STORAGE_CONNECTION_ENV: &str = "STORAGE_CONNECTION_STRING";

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub storage: StorageConnection,
}

impl PipelineConfig {
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let storage = connection_string
            .parse::<StorageConnection>()
            .context("invalid storage connection string")?;
        Ok(Self { storage })
    }

    /// Reads [`STORAGE_CONNECTION_ENV`]. A missing variable means the
    /// ambient AWS configuration is used as-is.
    pub fn from_env() -> Result<Self> {
        match std::env::var(STORAGE_CONNECTION_ENV) {
            Ok(value) => Self::from_connection_string(&value)
                .with_context(|| format!("failed to read {STORAGE_CONNECTION_ENV}")),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(e).context(format!("failed to read {STORAGE_CONNECTION_ENV}")),
        }
    }
}
