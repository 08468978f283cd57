//! Shared helpers for transport integration tests

use rtr_transport::ssh_capability::{
    ConnectParams, SshChannel, SshError, SshLibrary, SshSession, SshState,
};
use rtr_transport::CacheConfig;
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

/// Observable state shared between a test and its fake library
#[derive(Debug, Default)]
pub struct FakeState {
    /// Lifecycle events in the order they happened
    pub events: Vec<String>,
    /// Make `load` fail
    pub unavailable: bool,
    /// Make establishment fail at this step
    pub fail_at: Option<SshState>,
    /// Number of `connect` calls
    pub connects: u32,
    /// IDs of channels not yet dropped
    pub live_channels: Vec<u32>,
    /// Sessions not yet dropped
    pub live_sessions: u32,
    /// Bytes written to any channel
    pub written: Vec<u8>,
    next_channel: u32,
}

pub type Shared = Rc<RefCell<FakeState>>;

/// SSH capability that never touches the network
#[derive(Clone, Default)]
pub struct FakeLibrary {
    pub state: Shared,
}

impl FakeLibrary {
    pub fn new() -> (Self, Shared) {
        let lib = Self::default();
        let state = lib.state.clone();
        (lib, state)
    }

    fn step(&self, step: SshState) -> Result<(), SshError> {
        if self.state.borrow().fail_at == Some(step) {
            return Err(match step {
                SshState::ServerKnown => SshError::HostKeyMismatch {
                    host: "cache.example.org".to_string(),
                    port: 323,
                },
                SshState::UserAuth => SshError::Authentication {
                    user: "alice".to_string(),
                },
                _ => SshError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
            });
        }
        Ok(())
    }
}

pub struct FakeSession {
    state: Shared,
}

impl SshSession for FakeSession {
    fn disconnect(&mut self) -> Result<(), SshError> {
        self.state.borrow_mut().events.push("disconnect".to_string());
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.live_sessions -= 1;
        state.events.push("free session".to_string());
    }
}

pub struct FakeChannel {
    pub id: u32,
    open: bool,
    state: Shared,
}

impl Read for FakeChannel {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

impl Write for FakeChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.borrow_mut().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SshChannel for FakeChannel {
    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<(), SshError> {
        self.open = false;
        self.state.borrow_mut().events.push("close channel".to_string());
        Ok(())
    }
}

impl Drop for FakeChannel {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        let id = self.id;
        state.live_channels.retain(|live| *live != id);
        state.events.push("free channel".to_string());
    }
}

impl SshLibrary for FakeLibrary {
    type Session = FakeSession;
    type Channel = FakeChannel;

    fn load(&self) -> Result<(), SshError> {
        if self.state.borrow().unavailable {
            return Err(SshError::Unavailable("libssh2 not found".to_string()));
        }
        Ok(())
    }

    fn connect(&self, params: &ConnectParams) -> Result<FakeSession, SshError> {
        assert_eq!(params.subsystem, "rpki-rtr");
        self.state.borrow_mut().connects += 1;
        self.step(SshState::Connect)?;
        self.state.borrow_mut().live_sessions += 1;
        Ok(FakeSession {
            state: self.state.clone(),
        })
    }

    fn verify_host_key(&self, _: &mut FakeSession, _: &ConnectParams) -> Result<(), SshError> {
        self.step(SshState::ServerKnown)
    }

    fn authenticate(&self, _: &mut FakeSession, _: &ConnectParams) -> Result<(), SshError> {
        self.step(SshState::UserAuth)
    }

    fn open_channel(&self, _: &mut FakeSession) -> Result<FakeChannel, SshError> {
        self.step(SshState::Channel)?;
        let mut state = self.state.borrow_mut();
        state.next_channel += 1;
        let id = state.next_channel;
        state.live_channels.push(id);
        Ok(FakeChannel {
            id,
            open: true,
            state: self.state.clone(),
        })
    }

    fn request_subsystem(&self, _: &mut FakeChannel, _name: &str) -> Result<(), SshError> {
        self.step(SshState::Subsystem)
    }
}

/// SSH cache config used across tests
pub fn alice_config() -> CacheConfig {
    CacheConfig::new("cache.example.org", 323).with_ssh(
        "alice",
        "/etc/rpki/router_key",
        "/etc/rpki/known_hosts",
    )
}
