//! Messages exchanged with the remote end.
//!
//! - **packet**: kind-tagged opaque payloads as the transport sees them
//! - **message**: typed messages and the [`Codec`] seam the host implements
//!
//! # Kinds
//!
//! | Kind | Number | Payload |
//! |------|--------|---------|
//! | keep-alive | 0 | empty |
//! | terminal-buffer | 1 | raw bytes |
//! | terminal-info | 2 | rows, columns, pixel width, pixel height |
//! | initial-response | 252 | optional error |
//! | initial-payload | 253 | jumphost flag |
//!
//! Every other kind is passed through untouched.

pub mod message;
pub mod packet;

pub use message::{Codec, CodecError, Geometry, Message};
pub use packet::{Packet, PacketKind};
