//! Packet framing unit exchanged with the transport.
//!
//! A packet is a one-byte kind header followed by an opaque payload. The
//! transport moves packets; the codec gives them meaning.

use std::fmt;

/// Message kind carried in a packet header
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketKind(pub u8);

impl PacketKind {
    /// Heartbeat probe / acknowledgement (empty payload)
    pub const KEEP_ALIVE: PacketKind = PacketKind(0);
    /// Raw terminal bytes
    pub const TERMINAL_BUFFER: PacketKind = PacketKind(1);
    /// Terminal geometry report
    pub const TERMINAL_INFO: PacketKind = PacketKind(2);
    /// Server answer to the initial payload
    pub const INITIAL_RESPONSE: PacketKind = PacketKind(252);
    /// First message sent after the transport opens
    pub const INITIAL_PAYLOAD: PacketKind = PacketKind(253);

    /// Human readable name for logs
    pub fn name(self) -> &'static str {
        match self {
            Self::KEEP_ALIVE => "keep-alive",
            Self::TERMINAL_BUFFER => "terminal-buffer",
            Self::TERMINAL_INFO => "terminal-info",
            Self::INITIAL_RESPONSE => "initial-response",
            Self::INITIAL_PAYLOAD => "initial-payload",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An encoded message: kind header plus payload bytes
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    kind: PacketKind,
    payload: Vec<u8>,
}

impl Packet {
    pub fn new(kind: PacketKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

impl fmt::Debug for Packet {
    // Payloads can hold keystrokes, so only the size is shown
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("kind", &self.kind)
            .field("len", &self.payload.len())
            .finish()
    }
}
