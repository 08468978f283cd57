//! # RTR Transport
//!
//! Transport contract for RPKI-to-Router cache sessions and its SSH binding.
//!
//! A [`CacheSession`] owns a boxed [`Transport`] and drives it through
//! `open`, `close`, `identify` and `free`. [`SshTransport`] implements the
//! contract on top of an SSH `rpki-rtr` subsystem channel.

#![warn(missing_docs)]

pub use rtr_ssh as ssh_capability;

/// Error types for the transport layer
pub mod error;

/// Cache configuration
pub mod config;

/// Transport contract
pub mod transport;

/// SSH transport binding
pub mod ssh;

/// Cache session and transport lifecycle
pub mod session;

pub use config::{CacheConfig, SshCacheConfig, DEFAULT_RTR_PORT};
pub use error::{ConfigError, TransportError, TransportResult};
pub use session::CacheSession;
pub use ssh::SshTransport;
pub use transport::{ByteStream, Transport, TransportKind};
