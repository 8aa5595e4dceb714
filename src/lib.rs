//! etlink - drive one remote terminal session over a packet transport
//!
//! The host supplies already-open local input and output streams, a source
//! of terminal geometry, a connected-on-demand [`Transport`] and a message
//! [`Codec`]. etlink negotiates the session, then shuttles terminal bytes in
//! both directions, reports size changes, and keeps the link alive until the
//! local input ends or the remote side goes away.
//!
//! # Features
//!
//! - **Bounded handshake**: three connect attempts, three one-second polls
//!   for the server's answer per attempt
//! - **Keepalive**: probe after an idle interval, reconnect when the probe
//!   goes unanswered for another interval
//! - **Geometry**: sent once up front and again on every change
//! - **No aborts**: every fault ends the loop as a value; the host process
//!   is never torn down
//!
//! # Quick Start
//!
//! ```ignore
//! let local = LocalTerminal {
//!     input: LocalInput::from_fd(std::io::stdin()).unwrap(),
//!     output: std::io::stdout(),
//!     geometry: TerminalGeometry,
//! };
//! let exit = etlink::run_session(
//!     local,
//!     my_transport,
//!     my_codec,
//!     PollReadiness::new(),
//!     &Endpoint::new("build-box", 2022),
//!     &Credentials::new(id, passkey),
//!     &SessionConfig::default(),
//! );
//! std::process::exit(exit.code());
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod readiness;
pub mod transport;

#[cfg(test)]
mod testing;

use std::io::{Read, Write};

pub use crate::config::{HandshakeConfig, SessionConfig};
pub use crate::core::{
    EndReason, GeometrySource, HandshakeController, HandshakeError, LocalInput, Session,
    SessionOrchestrator, SessionReport, SharedGeometry, TerminalGeometry,
};
pub use crate::error::{Error, Result};
pub use crate::protocol::{Codec, CodecError, Geometry, Message, Packet, PacketKind};
#[cfg(unix)]
pub use crate::readiness::PollReadiness;
pub use crate::readiness::{Ready, Readiness, Watch};
pub use crate::transport::{
    Credentials, Descriptor, Endpoint, Transport, TransportError, TransportResult,
};

/// Local side of the session, provided by the host
pub struct LocalTerminal<I, O, G> {
    pub input: LocalInput<I>,
    pub output: O,
    pub geometry: G,
}

/// Process-level outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The session ran and shut down in order
    Clean,
    /// Bad arguments or the handshake failed
    Failure,
}

impl SessionExit {
    pub fn code(self) -> i32 {
        match self {
            SessionExit::Clean => 0,
            SessionExit::Failure => 1,
        }
    }
}

impl From<SessionExit> for std::process::ExitCode {
    fn from(exit: SessionExit) -> Self {
        std::process::ExitCode::from(exit.code() as u8)
    }
}

/// Negotiate a session and run it to completion.
///
/// Returns the run's report, or why the session never started.
pub fn start_session<I, O, G, T, C, R>(
    local: LocalTerminal<I, O, G>,
    transport: T,
    codec: C,
    mut readiness: R,
    endpoint: &Endpoint,
    credentials: &Credentials,
    config: &SessionConfig,
) -> Result<SessionReport>
where
    I: Read,
    O: Write,
    G: GeometrySource,
    T: Transport,
    C: Codec,
    R: Readiness,
{
    if !endpoint.is_valid() {
        return Err(Error::InvalidArgument("endpoint"));
    }
    if !credentials.is_valid() {
        return Err(Error::InvalidArgument("credentials"));
    }

    let session = HandshakeController::new(&config.handshake, &mut readiness).connect(
        transport,
        codec,
        endpoint,
        credentials,
    )?;

    let orchestrator = SessionOrchestrator::new(session, readiness, config);
    Ok(orchestrator.run(local.input, local.output, local.geometry))
}

/// [`start_session`] collapsed to an exit status
pub fn run_session<I, O, G, T, C, R>(
    local: LocalTerminal<I, O, G>,
    transport: T,
    codec: C,
    readiness: R,
    endpoint: &Endpoint,
    credentials: &Credentials,
    config: &SessionConfig,
) -> SessionExit
where
    I: Read,
    O: Write,
    G: GeometrySource,
    T: Transport,
    C: Codec,
    R: Readiness,
{
    match start_session(local, transport, codec, readiness, endpoint, credentials, config) {
        Ok(_) => SessionExit::Clean,
        Err(e) => {
            tracing::error!("Session failed: {}", e);
            SessionExit::Failure
        }
    }
}
