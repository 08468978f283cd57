//! SSH transport binding

use crate::{ByteStream, CacheConfig, Transport, TransportError, TransportKind, TransportResult};
use rtr_ssh::{ConnectParams, Libssh2, SshLibrary, SshSock, SshState, RTR_SUBSYSTEM};
use std::fmt::Write as _;
use tracing::{debug, info, warn};

/// Digits reserved for the port in an identifier
const PORT_DIGITS: usize = 5;

/// RTR transport over an SSH `rpki-rtr` subsystem channel
pub struct SshTransport<L: SshLibrary = Libssh2> {
    /// SSH capability
    lib: L,
    /// Connection state of the current attempt
    sock: Option<SshSock<L>>,
}

impl SshTransport {
    /// Create an SSH transport backed by libssh2
    pub fn new() -> Self {
        Self::with_library(Libssh2)
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: SshLibrary> SshTransport<L> {
    /// Create an SSH transport backed by the given capability
    pub fn with_library(lib: L) -> Self {
        Self { lib, sock: None }
    }

    /// The SSH capability in use
    pub fn library(&self) -> &L {
        &self.lib
    }

    /// Connection state, if an attempt is in progress or established
    pub fn socket(&self) -> Option<&SshSock<L>> {
        self.sock.as_ref()
    }

    /// Sub-state of the current attempt
    pub fn state(&self) -> Option<SshState> {
        self.sock.as_ref().map(SshSock::state)
    }
}

/// Build the connection parameters for `config`, if it has SSH credentials
pub fn connect_params(config: &CacheConfig) -> Option<ConnectParams> {
    let ssh = config.ssh.as_ref()?;
    Some(ConnectParams {
        host: config.hostname.clone(),
        port: config.port,
        username: ssh.username.clone(),
        private_key: ssh.private_key.clone(),
        known_hosts: ssh.cache_public_key.clone(),
        subsystem: RTR_SUBSYSTEM,
        timeout: config.timeout(),
    })
}

/// Format `<username>@<host>:<port>`.
///
/// Returns `None` if the buffer cannot be allocated.
pub fn format_ident(username: &str, host: &str, port: u16) -> Option<String> {
    let mut ident = String::new();
    ident
        .try_reserve_exact(username.len() + 1 + host.len() + 1 + PORT_DIGITS)
        .ok()?;
    write!(ident, "{}@{}:{}", username, host, port).ok()?;
    Some(ident)
}

impl<L: SshLibrary + 'static> Transport for SshTransport<L> {
    fn kind(&self) -> TransportKind {
        TransportKind::Ssh
    }

    fn open(&mut self, config: &CacheConfig) -> TransportResult {
        if let Err(e) = self.lib.load() {
            warn!("{}", e);
            return Err(TransportError);
        }

        let Some(params) = connect_params(config) else {
            warn!("Cache {}:{} has no SSH configuration", config.hostname, config.port);
            return Err(TransportError);
        };

        if self.sock.is_some() {
            debug!("Replacing stale SSH socket for {}:{}", config.hostname, config.port);
        }

        info!("Connecting to {}@{}:{}", params.username, params.host, params.port);
        let sock = self.sock.insert(SshSock::new(params));

        if let Err(e) = sock.establish(&self.lib) {
            warn!(
                "SSH connection to {}:{} failed in {:?}: {}",
                config.hostname,
                config.port,
                sock.state(),
                e
            );
            return Err(TransportError);
        }

        info!("SSH transport to {}:{} established", config.hostname, config.port);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut sock) = self.sock.take() {
            let params = sock.params();
            debug!("Closing SSH transport to {}:{}", params.host, params.port);
            sock.teardown();
        }
    }

    fn free(self: Box<Self>) {
        if let Some(sock) = &self.sock {
            debug!(
                "SSH transport to {}:{} freed without close, tearing down",
                sock.params().host,
                sock.params().port
            );
        }
    }

    fn ident(&self, config: &CacheConfig) -> Option<String> {
        let ssh = config.ssh.as_ref()?;
        format_ident(&ssh.username, &config.hostname, config.port)
    }

    fn is_connected(&self) -> bool {
        self.sock.as_ref().is_some_and(SshSock::is_active)
    }

    fn stream(&mut self) -> Option<&mut dyn ByteStream> {
        let sock = self.sock.as_mut().filter(|sock| sock.is_active())?;
        let channel = sock.channel_mut()?;
        Some(channel)
    }
}
