//! Core session driving components.
//!
//! - **handshake**: bounded-retry connect and initial negotiation
//! - **session**: the negotiated transport + codec handle
//! - **orchestrator**: the main loop multiplexing local I/O and the session
//! - **dispatch**: inbound message handling and full-write discipline
//! - **keepalive**: idle probe / reconnect state machine
//! - **geometry**: terminal size change detection
//!
//! # Architecture
//!
//! ```text
//! HandshakeController ──> Session
//!                            │
//! SessionOrchestrator ───────┘
//! ├── Readiness (wait on input + transport)
//! ├── dispatch (inbound → local output)
//! ├── KeepaliveMonitor
//! └── GeometryWatcher
//! ```

pub mod dispatch;
pub mod geometry;
pub mod handshake;
pub mod keepalive;
pub mod orchestrator;
pub mod session;

pub use geometry::{GeometrySource, GeometryWatcher, SharedGeometry, TerminalGeometry};
pub use handshake::{HandshakeController, HandshakeError};
pub use keepalive::{KeepaliveAction, KeepaliveMonitor, KeepaliveState};
pub use orchestrator::{EndReason, LocalInput, SessionOrchestrator, SessionReport};
pub use session::{Session, SessionError};
