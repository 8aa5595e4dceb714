//! Session handle
//!
//! Pairs a connected transport with the codec. Created by the handshake and
//! owned by the orchestrator for the rest of the run.

use thiserror::Error;

use crate::protocol::{Codec, CodecError, Message};
use crate::transport::{Descriptor, Transport, TransportError};

/// Steady-state failure on the session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A live, negotiated session
///
/// The transport is shut down exactly once, either through
/// [`Session::shutdown`] or when the session is dropped.
pub struct Session<T: Transport, C: Codec> {
    transport: T,
    codec: C,
    closed: bool,
}

impl<T: Transport, C: Codec> Session<T, C> {
    pub(crate) fn new(transport: T, codec: C) -> Self {
        Self {
            transport,
            codec,
            closed: false,
        }
    }

    /// Encode and send a message
    pub fn send(&mut self, message: &Message) -> Result<(), SessionError> {
        let packet = self.codec.encode(message)?;
        self.transport.send(packet)?;
        Ok(())
    }

    /// Receive and decode one pending message, if any
    pub fn try_receive(&mut self) -> Result<Option<Message>, SessionError> {
        match self.transport.try_receive()? {
            Some(packet) => Ok(Some(self.codec.decode(packet)?)),
            None => Ok(None),
        }
    }

    /// Current readiness descriptor; `None` while the transport reconnects
    pub fn descriptor(&self) -> Option<Descriptor> {
        self.transport.descriptor()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.transport.is_shutting_down()
    }

    pub fn request_reconnect(&mut self) {
        tracing::info!("Requesting transport reconnect");
        self.transport.request_reconnect();
    }

    /// Shut the transport down and consume the session
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::info!("Shutting down session");
            self.transport.shutdown();
        }
    }
}

impl<T: Transport, C: Codec> Drop for Session<T, C> {
    fn drop(&mut self) {
        self.close();
    }
}
