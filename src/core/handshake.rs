//! Connection establishment and initial negotiation
//!
//! # Flow
//!
//! ```text
//! attempt 1..=max_attempts:
//!     open transport ── fail ──────────────────────────┐
//!     send InitialPayload { jumphost: false }          │
//!     poll 1..=response_polls (response_timeout each): │
//!         readable → receive one message               │
//!             InitialResponse, no error → Session      │
//!             InitialResponse, error    → Rejected     │
//!             anything else             → UnexpectedKind
//!     no answer ───────────────────────────────────────┴─> next attempt
//! ```
//!
//! A rejection, an unexpected kind, or any transport/codec error ends the
//! handshake at once. Only silence is retried.

use std::thread;

use thiserror::Error;

use super::session::Session;
use crate::config::HandshakeConfig;
use crate::protocol::{Codec, CodecError, Message, PacketKind};
use crate::readiness::{Readiness, Watch};
use crate::transport::{Credentials, Endpoint, Transport, TransportError};

#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("no initial response after {attempts} connection attempts")]
    Exhausted { attempts: u32 },

    #[error("server rejected the session: {0}")]
    Rejected(String),

    #[error("protocol error: expected initial-response, received {0}")]
    UnexpectedKind(PacketKind),

    #[error("transport failed during handshake: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid message during handshake: {0}")]
    Codec(#[from] CodecError),

    #[error("readiness wait failed during handshake: {0}")]
    Readiness(#[from] std::io::Error),
}

/// Outcome of a single attempt that did not fail the handshake outright
enum Attempt {
    Accepted,
    NoResponse,
}

/// Bounded-retry connector
pub struct HandshakeController<'a, R: Readiness> {
    config: &'a HandshakeConfig,
    readiness: R,
}

impl<'a, R: Readiness> HandshakeController<'a, R> {
    pub fn new(config: &'a HandshakeConfig, readiness: R) -> Self {
        Self { config, readiness }
    }

    /// Open `transport` and negotiate. On success the transport is handed
    /// over to the returned session.
    pub fn connect<T: Transport, C: Codec>(
        &mut self,
        mut transport: T,
        codec: C,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Session<T, C>, HandshakeError> {
        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            tracing::info!("Connecting to {} (attempt {}/{})", endpoint, attempt, max_attempts);
            match self.attempt(&mut transport, &codec, endpoint, credentials)? {
                Attempt::Accepted => {
                    tracing::info!("Session established with {}", endpoint);
                    return Ok(Session::new(transport, codec));
                }
                Attempt::NoResponse => {
                    tracing::warn!("No initial response from {} on attempt {}", endpoint, attempt);
                }
            }
        }
        Err(HandshakeError::Exhausted {
            attempts: max_attempts,
        })
    }

    fn attempt<T: Transport, C: Codec>(
        &mut self,
        transport: &mut T,
        codec: &C,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Attempt, HandshakeError> {
        if !transport.open(endpoint, credentials)? {
            return Ok(Attempt::NoResponse);
        }

        let payload = codec.encode(&Message::InitialPayload { jumphost: false })?;
        transport.send(payload)?;

        let timeout = self.config.response_timeout();
        for _ in 0..self.config.response_polls {
            let Some(descriptor) = transport.descriptor() else {
                thread::sleep(timeout);
                continue;
            };

            let ready = self.readiness.wait(&[Watch::transport(descriptor)], timeout)?;
            if ready.is_empty() {
                continue;
            }
            let Some(packet) = transport.try_receive()? else {
                continue;
            };

            return match codec.decode(packet)? {
                Message::InitialResponse { error: None } => Ok(Attempt::Accepted),
                Message::InitialResponse { error: Some(error) } => {
                    Err(HandshakeError::Rejected(error))
                }
                other => Err(HandshakeError::UnexpectedKind(other.kind())),
            };
        }
        Ok(Attempt::NoResponse)
    }
}
