//! SSH-specific error types

use std::io;
use thiserror::Error;

/// Errors raised by the SSH capability
#[derive(Debug, Error)]
pub enum SshError {
    /// The SSH library could not be loaded or initialised
    #[error("SSH support unavailable: {0}")]
    Unavailable(String),

    /// Host name did not resolve to any address
    #[error("Cannot resolve {host}:{port}")]
    Resolve {
        /// Remote host name
        host: String,
        /// Remote port
        port: u16,
    },

    /// TCP connection could not be established
    #[error("Connection to {host}:{port} failed: {source}")]
    Connect {
        /// Remote host name
        host: String,
        /// Remote port
        port: u16,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Server presented no host key during the handshake
    #[error("Server {host}:{port} sent no host key")]
    MissingHostKey {
        /// Remote host name
        host: String,
        /// Remote port
        port: u16,
    },

    /// Host key is not listed in the configured known_hosts file
    #[error("Host key for {host}:{port} not found in known hosts")]
    HostKeyUnknown {
        /// Remote host name
        host: String,
        /// Remote port
        port: u16,
    },

    /// Host key differs from the one in the configured known_hosts file
    #[error("Host key for {host}:{port} does not match known hosts")]
    HostKeyMismatch {
        /// Remote host name
        host: String,
        /// Remote port
        port: u16,
    },

    /// known_hosts lookup could not be performed
    #[error("Known hosts check for {host}:{port} failed: {message}")]
    KnownHosts {
        /// Remote host name
        host: String,
        /// Remote port
        port: u16,
        /// Reason the check failed
        message: String,
    },

    /// Public key authentication was rejected
    #[error("Authentication failed for user '{user}'")]
    Authentication {
        /// User that tried to authenticate
        user: String,
    },

    /// Subsystem request was refused by the server
    #[error("Subsystem '{name}' request failed: {message}")]
    Subsystem {
        /// Requested subsystem
        name: String,
        /// Library error message
        message: String,
    },

    /// Connection state lost a resource an earlier step created
    #[error("Inconsistent connection state: {0}")]
    State(String),

    /// Error reported by libssh2
    #[error("libssh2 error: {0}")]
    Library(#[from] ssh2::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SshError {
    /// Whether this error came from host key verification
    pub fn is_host_key_error(&self) -> bool {
        matches!(
            self,
            Self::MissingHostKey { .. }
                | Self::HostKeyUnknown { .. }
                | Self::HostKeyMismatch { .. }
                | Self::KnownHosts { .. }
        )
    }
}
