use serde::{Deserialize, Serialize};

use crate::{ConfigError, DestinationConfig, ExecutionTime, SourceConfig};

/// Complete startup configuration for the transfer service.
///
/// Assembled once from the command line, validated, and then passed by
/// reference into the scheduler and pipeline; the core logic never reads
/// ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransferConfig {
    /// Analytical source database settings.
    pub source: SourceConfig,
    /// Operational destination database settings.
    pub destination: DestinationConfig,
    /// Wall-clock time of day at which the daily run fires.
    pub execution_time: ExecutionTime,
}

impl TransferConfig {
    /// Validates the configuration by parsing both DSNs.
    ///
    /// Run at startup so a malformed DSN fails the process immediately
    /// instead of on the first scheduled run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.connect_options()?;
        self.destination.connect_options()?;

        Ok(())
    }
}
