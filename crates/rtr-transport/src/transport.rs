//! Transport contract shared by every cache transport

use crate::{CacheConfig, TransportResult};
use std::io::{Read, Write};

/// A bidirectional byte stream carrying RTR PDUs
pub trait ByteStream: Read + Write {}

impl<T: Read + Write + ?Sized> ByteStream for T {}

/// Transport type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Plain TCP
    Tcp,
    /// SSH subsystem channel
    Ssh,
}

/// Transport abstraction driven by the RTR session.
///
/// The session calls `open` on (re)connect, `close` on teardown or error,
/// `ident` for diagnostics and `free` once when it is destroyed. A transport
/// never calls back into the session.
pub trait Transport {
    /// Transport type
    fn kind(&self) -> TransportKind;

    /// Establish the connection described by `config`.
    ///
    /// Expects a closed transport. On failure anything partially set up is
    /// left for `close` to release.
    fn open(&mut self, config: &CacheConfig) -> TransportResult;

    /// Release the live connection, if any. Always leaves the transport
    /// closed and ready for another `open`.
    fn close(&mut self);

    /// Destroy the transport itself. The connection must already be closed.
    fn free(self: Box<Self>) {}

    /// Format the diagnostic identifier for this endpoint.
    ///
    /// Returns `None` when the identifier cannot be produced.
    fn ident(&self, config: &CacheConfig) -> Option<String>;

    /// Whether a connection is established and usable
    fn is_connected(&self) -> bool;

    /// The connection's byte stream, once established
    fn stream(&mut self) -> Option<&mut dyn ByteStream>;
}
