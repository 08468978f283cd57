//! SSH connection state

use crate::{ConnectParams, SshChannel, SshError, SshLibrary, SshSession};
use std::fmt;
use tracing::debug;

/// Progress of connection establishment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshState {
    /// TCP connect and handshake pending
    Connect,
    /// Handshake done, host key being verified
    ServerKnown,
    /// Host key accepted, authenticating
    UserAuth,
    /// Authenticated, opening the channel
    Channel,
    /// Channel open, requesting the subsystem
    Subsystem,
    /// Subsystem running, channel carries protocol data
    Active,
}

/// Connection state for one SSH attempt.
///
/// A socket is built fresh for every attempt. Whatever `establish` manages
/// to create stays inside it, also on failure, and is released by
/// [`SshSock::teardown`]. Dropping a socket runs the same teardown.
pub struct SshSock<L: SshLibrary> {
    params: ConnectParams,
    state: SshState,
    session: Option<L::Session>,
    channel: Option<L::Channel>,
}

impl<L: SshLibrary> SshSock<L> {
    /// Create a socket in the `Connect` state
    pub fn new(params: ConnectParams) -> Self {
        Self {
            params,
            state: SshState::Connect,
            session: None,
            channel: None,
        }
    }

    /// Connection parameters
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Current sub-state
    pub fn state(&self) -> SshState {
        self.state
    }

    /// Whether the subsystem channel is ready for protocol data
    pub fn is_active(&self) -> bool {
        self.state == SshState::Active && self.channel.is_some()
    }

    /// Library session, if the handshake got that far
    pub fn session(&self) -> Option<&L::Session> {
        self.session.as_ref()
    }

    /// Channel, if authentication succeeded and one was opened
    pub fn channel(&self) -> Option<&L::Channel> {
        self.channel.as_ref()
    }

    /// Mutable channel access for reading and writing
    pub fn channel_mut(&mut self) -> Option<&mut L::Channel> {
        self.channel.as_mut()
    }

    /// Run every establishment step from the current state up to `Active`
    pub fn establish(&mut self, lib: &L) -> Result<(), SshError> {
        loop {
            match self.state {
                SshState::Connect => {
                    self.session = Some(lib.connect(&self.params)?);
                    self.state = SshState::ServerKnown;
                }
                SshState::ServerKnown => {
                    let session = self.session.as_mut().ok_or_else(|| missing("session"))?;
                    lib.verify_host_key(session, &self.params)?;
                    self.state = SshState::UserAuth;
                }
                SshState::UserAuth => {
                    let session = self.session.as_mut().ok_or_else(|| missing("session"))?;
                    lib.authenticate(session, &self.params)?;
                    self.state = SshState::Channel;
                }
                SshState::Channel => {
                    let session = self.session.as_mut().ok_or_else(|| missing("session"))?;
                    self.channel = Some(lib.open_channel(session)?);
                    self.state = SshState::Subsystem;
                }
                SshState::Subsystem => {
                    let channel = self.channel.as_mut().ok_or_else(|| missing("channel"))?;
                    lib.request_subsystem(channel, self.params.subsystem)?;
                    self.state = SshState::Active;
                }
                SshState::Active => return Ok(()),
            }
            debug!(
                "SSH {}@{}:{} reached {:?}",
                self.params.username, self.params.host, self.params.port, self.state
            );
        }
    }

    /// Release the channel, then the session.
    ///
    /// Every step tolerates the resource being absent, so this is valid in
    /// any partial state.
    pub fn teardown(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if channel.is_open() {
                if let Err(e) = channel.close() {
                    debug!("Closing SSH channel failed: {}", e);
                }
            }
            drop(channel);
        }

        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.disconnect() {
                debug!("SSH disconnect failed: {}", e);
            }
            drop(session);
        }
    }
}

fn missing(what: &str) -> SshError {
    SshError::State(format!("{} missing", what))
}

impl<L: SshLibrary> Drop for SshSock<L> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<L: SshLibrary> fmt::Debug for SshSock<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshSock")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("session", &self.session.is_some())
            .field("channel", &self.channel.is_some())
            .finish()
    }
}
