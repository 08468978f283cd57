//! Lifecycle tests for the SSH transport binding
//!
//! These drive `SshTransport` and `CacheSession` against a fake SSH
//! capability, so open/close/identify/free can be checked without a cache.

mod integration;

use anyhow::Result;
use integration::*;
use rtr_transport::ssh_capability::SshState;
use rtr_transport::{CacheSession, SshTransport, Transport, TransportError};
use std::io::Write;

fn session_with_fake() -> (CacheSession, Shared) {
    let (lib, state) = FakeLibrary::new();
    let session =
        CacheSession::with_transport(alice_config(), Box::new(SshTransport::with_library(lib)));
    (session, state)
}

#[test]
fn test_close_before_open_is_noop() {
    let (lib, state) = FakeLibrary::new();
    let mut transport = SshTransport::with_library(lib);

    transport.close();
    transport.close();

    assert!(transport.socket().is_none());
    assert!(!transport.is_connected());
    assert!(state.borrow().events.is_empty());
}

#[test]
fn test_close_twice_equals_close_once() {
    let (lib, state) = FakeLibrary::new();
    let mut transport = SshTransport::with_library(lib);
    let config = alice_config();

    transport.open(&config).unwrap();
    assert!(transport.is_connected());

    transport.close();
    let after_first = state.borrow().events.clone();
    transport.close();

    assert_eq!(state.borrow().events, after_first);
    assert!(transport.socket().is_none());
    assert_eq!(state.borrow().live_sessions, 0);
    assert!(state.borrow().live_channels.is_empty());
}

#[test]
fn test_teardown_order() {
    let (lib, state) = FakeLibrary::new();
    let mut transport = SshTransport::with_library(lib);

    transport.open(&alice_config()).unwrap();
    transport.close();

    assert_eq!(
        state.borrow().events,
        vec!["close channel", "free channel", "disconnect", "free session"]
    );
}

#[test]
fn test_load_failure_leaves_transport_untouched() {
    let (lib, state) = FakeLibrary::new();
    state.borrow_mut().unavailable = true;
    let mut transport = SshTransport::with_library(lib);

    assert_eq!(transport.open(&alice_config()), Err(TransportError));
    assert!(transport.socket().is_none());
    assert_eq!(state.borrow().connects, 0);
}

#[test]
fn test_failed_auth_is_cleaned_by_close() {
    let (lib, state) = FakeLibrary::new();
    state.borrow_mut().fail_at = Some(SshState::UserAuth);
    let mut transport = SshTransport::with_library(lib);

    assert_eq!(transport.open(&alice_config()), Err(TransportError));

    // open leaves the half-open socket in place
    assert_eq!(transport.state(), Some(SshState::UserAuth));
    assert!(transport.socket().unwrap().channel().is_none());
    assert!(!transport.is_connected());
    assert_eq!(state.borrow().live_sessions, 1);

    transport.close();
    assert!(transport.socket().is_none());
    assert_eq!(state.borrow().live_sessions, 0);
    assert_eq!(state.borrow().events, vec!["disconnect", "free session"]);
}

#[test]
fn test_host_key_mismatch_fails_open() {
    let (lib, state) = FakeLibrary::new();
    state.borrow_mut().fail_at = Some(SshState::ServerKnown);
    let mut transport = SshTransport::with_library(lib);

    assert_eq!(transport.open(&alice_config()), Err(TransportError));
    assert_eq!(transport.state(), Some(SshState::ServerKnown));
    transport.close();
}

#[test]
fn test_identify_formats_and_caches() {
    let (session, _state) = session_with_fake();

    let first = session.identify().unwrap();
    let second = session.identify().unwrap();

    assert_eq!(first, "alice@cache.example.org:323");
    assert!(std::ptr::eq(first, second));
}

#[test]
fn test_free_without_identify() {
    let (mut session, _state) = session_with_fake();

    session.free_transport();
    session.free_transport();
    assert!(session.transport().is_none());
}

#[test]
fn test_reopen_uses_fresh_channel() -> Result<()> {
    let (mut session, state) = session_with_fake();

    session.open()?;
    assert_eq!(session.identify(), Some("alice@cache.example.org:323"));
    let first = state.borrow().live_channels.clone();
    assert_eq!(first.len(), 1);

    session.close();
    assert!(state.borrow().live_channels.is_empty());
    assert!(!session.is_connected());

    session.open()?;
    let second = state.borrow().live_channels.clone();
    assert_eq!(second.len(), 1);
    assert_ne!(first[0], second[0]);
    assert_eq!(state.borrow().connects, 2);

    // the identifier survives reconnects
    assert_eq!(session.identify(), Some("alice@cache.example.org:323"));
    Ok(())
}

#[test]
fn test_stream_carries_bytes_when_connected() {
    let (mut session, state) = session_with_fake();
    assert!(session.stream().is_none());

    session.open().unwrap();
    let stream = session.stream().unwrap();
    stream.write_all(&[0x01, 0x0a, 0x00, 0x00]).unwrap();
    stream.flush().unwrap();
    assert_eq!(state.borrow().written, vec![0x01, 0x0a, 0x00, 0x00]);

    session.close();
    assert!(session.stream().is_none());
}

#[test]
fn test_drop_tears_everything_down() {
    let (mut session, state) = session_with_fake();
    session.open().unwrap();

    drop(session);
    assert_eq!(state.borrow().live_sessions, 0);
    assert!(state.borrow().live_channels.is_empty());
}

#[test]
fn test_failed_open_is_torn_down_by_reopen() {
    let (lib, state) = FakeLibrary::new();
    state.borrow_mut().fail_at = Some(SshState::Subsystem);
    let mut transport = SshTransport::with_library(lib);

    assert_eq!(transport.open(&alice_config()), Err(TransportError));
    assert_eq!(state.borrow().live_channels.len(), 1);

    state.borrow_mut().fail_at = None;
    transport.open(&alice_config()).unwrap();

    // the stale socket went down in order before the new one took over
    assert_eq!(
        state.borrow().events,
        vec!["close channel", "free channel", "disconnect", "free session"]
    );
    assert_eq!(state.borrow().live_sessions, 1);
    assert_eq!(state.borrow().live_channels.len(), 1);
    assert!(transport.is_connected());
}

#[test]
fn test_free_without_close_tears_down_in_order() {
    let (lib, state) = FakeLibrary::new();
    let mut transport: Box<dyn Transport> = Box::new(SshTransport::with_library(lib));

    transport.open(&alice_config()).unwrap();
    transport.free();

    assert_eq!(
        state.borrow().events,
        vec!["close channel", "free channel", "disconnect", "free session"]
    );
    assert_eq!(state.borrow().live_sessions, 0);
    assert!(state.borrow().live_channels.is_empty());
}
