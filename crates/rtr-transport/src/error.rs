//! Error types for the transport layer

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a transport operation.
///
/// Transports report only whether an attempt worked; the cause is written
/// to the trace output where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transport error")]
pub struct TransportError;

/// Outcome of a transport operation
pub type TransportResult = std::result::Result<(), TransportError>;

/// Errors while loading a cache configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Config could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Config is syntactically fine but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("JSON error: {}", err))
    }
}
