//! Transport collaborator interface.
//!
//! The transport owns the network connection: establishing it, framing and
//! encrypting packets, and reconnecting in the background. This crate only
//! drives it through [`Transport`].

use std::fmt;
use std::io;

use thiserror::Error;

use crate::protocol::Packet;

/// An OS-level readiness handle (a file descriptor on unix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor(i32);

impl Descriptor {
    /// Wrap a raw descriptor, rejecting negative values
    pub fn new(raw: i32) -> Option<Self> {
        (raw >= 0).then_some(Self(raw))
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    #[cfg(unix)]
    pub fn of<T: std::os::unix::io::AsRawFd>(handle: &T) -> Option<Self> {
        Self::new(handle.as_raw_fd())
    }
}

/// Remote address to connect to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Client identity and passkey presented when the transport opens
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: String,
    passkey: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, passkey: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            passkey: passkey.into(),
        }
    }

    pub fn passkey(&self) -> &str {
        &self.passkey
    }

    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.passkey.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("passkey", &"<redacted>")
            .finish()
    }
}

/// Failure reported by a transport implementation
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A packet transport with its own reconnect policy.
///
/// Implementations must report fatal conditions through [`TransportError`]
/// (or by flipping [`Transport::is_shutting_down`]) and never abort the
/// process, including from background reconnect work.
pub trait Transport {
    /// Connect to `endpoint`. `Ok(false)` means the attempt failed cleanly.
    fn open(&mut self, endpoint: &Endpoint, credentials: &Credentials) -> TransportResult<bool>;

    /// Queue one packet for sending
    fn send(&mut self, packet: Packet) -> TransportResult<()>;

    /// Take one received packet without blocking
    fn try_receive(&mut self) -> TransportResult<Option<Packet>>;

    /// Descriptor that becomes readable when packets arrive, if connected
    fn descriptor(&self) -> Option<Descriptor>;

    fn is_shutting_down(&self) -> bool;

    /// Drop the current socket and let the transport reconnect
    fn request_reconnect(&mut self);

    fn shutdown(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self, endpoint: &Endpoint, credentials: &Credentials) -> TransportResult<bool> {
        (**self).open(endpoint, credentials)
    }

    fn send(&mut self, packet: Packet) -> TransportResult<()> {
        (**self).send(packet)
    }

    fn try_receive(&mut self) -> TransportResult<Option<Packet>> {
        (**self).try_receive()
    }

    fn descriptor(&self) -> Option<Descriptor> {
        (**self).descriptor()
    }

    fn is_shutting_down(&self) -> bool {
        (**self).is_shutting_down()
    }

    fn request_reconnect(&mut self) {
        (**self).request_reconnect()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}
