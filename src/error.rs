//! Library error types

use thiserror::Error;

/// Failure surfaced by the MIDI mapping client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The MIDI source refused (or could not accept) a receive handler
    #[error("MIDI mapping is not available: {0}")]
    NotAvailable(String),
}

/// Failure while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
