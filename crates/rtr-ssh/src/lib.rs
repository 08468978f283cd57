//! # RTR SSH
//!
//! SSH capability layer for the RPKI-to-Router transport. Wraps libssh2
//! behind a small trait so the transport binding only sees connect, verify,
//! authenticate, channel and teardown steps.

#![warn(missing_docs)]

/// Capability traits and connection parameters
pub mod capability;

/// Per-attempt SSH connection state
pub mod connection;

/// libssh2 implementation of the capability
pub mod libssh2;

/// SSH-specific error types
pub mod error;

pub use capability::{ConnectParams, SshChannel, SshLibrary, SshSession, RTR_SUBSYSTEM};
pub use connection::{SshSock, SshState};
pub use error::SshError;
pub use libssh2::{load_libssh2, Libssh2, Libssh2Channel};
