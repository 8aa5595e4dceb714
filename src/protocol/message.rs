//! Typed messages and the codec seam.
//!
//! The wire encoding of each payload belongs to the host. This crate only
//! needs to turn packets into [`Message`] values and back, so it asks for a
//! [`Codec`] implementation.

use thiserror::Error;

use super::packet::{Packet, PacketKind};

/// Terminal dimensions, in cells and pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub rows: u16,
    pub columns: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl Geometry {
    pub const fn new(rows: u16, columns: u16, pixel_width: u16, pixel_height: u16) -> Self {
        Self {
            rows,
            columns,
            pixel_width,
            pixel_height,
        }
    }
}

/// A decoded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Opening negotiation sent by the client
    InitialPayload { jumphost: bool },
    /// Server reply to the opening negotiation
    InitialResponse { error: Option<String> },
    /// Terminal bytes in either direction
    TerminalBuffer(Vec<u8>),
    /// Local terminal geometry
    TerminalInfo(Geometry),
    /// Keepalive probe or acknowledgement
    KeepAlive,
    /// Any kind this crate does not interpret, kept verbatim
    Other(Packet),
}

impl Message {
    /// Header kind this message is carried under
    pub fn kind(&self) -> PacketKind {
        match self {
            Message::InitialPayload { .. } => PacketKind::INITIAL_PAYLOAD,
            Message::InitialResponse { .. } => PacketKind::INITIAL_RESPONSE,
            Message::TerminalBuffer(_) => PacketKind::TERMINAL_BUFFER,
            Message::TerminalInfo(_) => PacketKind::TERMINAL_INFO,
            Message::KeepAlive => PacketKind::KEEP_ALIVE,
            Message::Other(packet) => packet.kind(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed {kind} payload: {reason}")]
    Malformed { kind: PacketKind, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Converts between packets and typed messages.
///
/// Implementations must decode unknown kinds to [`Message::Other`] and encode
/// it back to the identical packet.
pub trait Codec {
    fn encode(&self, message: &Message) -> Result<Packet, CodecError>;
    fn decode(&self, packet: Packet) -> Result<Message, CodecError>;
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn encode(&self, message: &Message) -> Result<Packet, CodecError> {
        (**self).encode(message)
    }

    fn decode(&self, packet: Packet) -> Result<Message, CodecError> {
        (**self).decode(packet)
    }
}
