//! Capability abstraction over an SSH library

use crate::SshError;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Subsystem name of the RPKI-to-Router protocol channel
pub const RTR_SUBSYSTEM: &str = "rpki-rtr";

/// Parameters needed to reach and authenticate against a cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Remote hostname or IP
    pub host: String,
    /// Remote port
    pub port: u16,
    /// Username
    pub username: String,
    /// Local private key used for public key authentication
    pub private_key: PathBuf,
    /// known_hosts file holding the cache's public host key
    pub known_hosts: PathBuf,
    /// Subsystem requested on the channel
    pub subsystem: &'static str,
    /// Socket timeout for connect, handshake and blocking reads; zero means no limit
    pub timeout: Duration,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 22,
            username: "rpki".to_string(),
            private_key: PathBuf::new(),
            known_hosts: PathBuf::new(),
            subsystem: RTR_SUBSYSTEM,
            timeout: Duration::from_secs(30),
        }
    }
}

/// An authenticated SSH session
pub trait SshSession {
    /// Disconnect from the server
    fn disconnect(&mut self) -> Result<(), SshError>;
}

/// A logical channel inside an SSH session, usable as a byte stream
pub trait SshChannel: Read + Write {
    /// Whether the channel is still open from our side
    fn is_open(&self) -> bool;

    /// Request the channel to be closed
    fn close(&mut self) -> Result<(), SshError>;
}

/// The operations the transport binding needs from an SSH library.
///
/// Each step of connection establishment is a separate call so the caller
/// can record partial progress; anything created before a failing step is
/// handed back to the caller and must be torn down by it.
pub trait SshLibrary {
    /// Library session type
    type Session: SshSession;
    /// Library channel type
    type Channel: SshChannel;

    /// Make sure the library is loaded and initialised
    fn load(&self) -> Result<(), SshError>;

    /// Open the TCP connection and run the SSH handshake
    fn connect(&self, params: &ConnectParams) -> Result<Self::Session, SshError>;

    /// Check the server host key against the configured known hosts
    fn verify_host_key(
        &self,
        session: &mut Self::Session,
        params: &ConnectParams,
    ) -> Result<(), SshError>;

    /// Authenticate with the configured private key
    fn authenticate(
        &self,
        session: &mut Self::Session,
        params: &ConnectParams,
    ) -> Result<(), SshError>;

    /// Open a session channel
    fn open_channel(&self, session: &mut Self::Session) -> Result<Self::Channel, SshError>;

    /// Request a subsystem on an open channel
    fn request_subsystem(&self, channel: &mut Self::Channel, name: &str) -> Result<(), SshError>;
}
