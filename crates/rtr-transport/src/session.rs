//! Cache session and its transport lifecycle

use crate::{ByteStream, CacheConfig, SshTransport, Transport, TransportError, TransportResult};
use std::cell::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

/// One configured remote cache, as seen by the RTR engine.
///
/// The session owns its transport binding and the cached identifier of the
/// endpoint. The identifier is computed on first use and kept until the
/// transport is freed.
pub struct CacheSession {
    /// Session ID used to correlate trace output
    id: Uuid,
    /// Cache configuration
    config: CacheConfig,
    /// Transport binding, until freed
    transport: Option<Box<dyn Transport>>,
    /// Cached transport identifier
    ident: OnceCell<String>,
}

impl CacheSession {
    /// Create a session, attaching an SSH transport when the config has SSH
    /// credentials
    pub fn new(config: CacheConfig) -> Self {
        let transport: Option<Box<dyn Transport>> = match config.ssh {
            Some(_) => Some(Box::new(SshTransport::new())),
            None => None,
        };
        Self::build(config, transport)
    }

    /// Create a session using the given transport binding
    pub fn with_transport(config: CacheConfig, transport: Box<dyn Transport>) -> Self {
        Self::build(config, Some(transport))
    }

    fn build(config: CacheConfig, transport: Option<Box<dyn Transport>>) -> Self {
        let id = Uuid::new_v4();
        debug!(
            "Created cache session {} for {}:{} ({:?})",
            id,
            config.hostname,
            config.port,
            transport.as_ref().map(|t| t.kind())
        );
        Self {
            id,
            config,
            transport,
            ident: OnceCell::new(),
        }
    }

    /// Session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The transport binding, unless it was freed
    pub fn transport(&self) -> Option<&dyn Transport> {
        self.transport.as_deref()
    }

    /// Mutable access to the transport binding
    pub fn transport_mut(&mut self) -> Option<&mut (dyn Transport + 'static)> {
        self.transport.as_deref_mut()
    }

    /// Whether the transport is connected
    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_connected())
    }

    /// Open the transport
    pub fn open(&mut self) -> TransportResult {
        let Some(transport) = self.transport.as_mut() else {
            warn!("Session {} has no transport to open", self.id);
            return Err(TransportError);
        };
        transport.open(&self.config)
    }

    /// Close the transport's connection. Safe to call at any time.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
    }

    /// The transport's byte stream while connected
    pub fn stream(&mut self) -> Option<&mut dyn ByteStream> {
        self.transport.as_mut()?.stream()
    }

    /// Identifier of the transport endpoint.
    ///
    /// Computed once; later calls return the same string until the
    /// transport is freed. `None` means the identifier is unavailable.
    pub fn identify(&self) -> Option<&str> {
        debug_assert!(self.transport.is_some(), "identify on a freed transport");

        if let Some(ident) = self.ident.get() {
            return Some(ident);
        }

        let ident = self.transport.as_ref()?.ident(&self.config)?;
        Some(self.ident.get_or_init(|| ident))
    }

    /// Destroy the transport binding and its cached identifier.
    ///
    /// Call `close` first. Calling this again is a no-op.
    pub fn free_transport(&mut self) {
        if let Some(transport) = self.transport.take() {
            self.ident.take();
            transport.free();
            debug!("Freed transport of session {}", self.id);
        }
    }
}

impl Drop for CacheSession {
    fn drop(&mut self) {
        self.close();
        self.free_transport();
    }
}
