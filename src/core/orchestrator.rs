//! Session main loop
//!
//! One tick, in order:
//!
//! 1. wait up to `poll_timeout` for local input or the transport
//! 2. local input ready: one read, forwarded as terminal data
//! 3. transport ready: drain every pending inbound message
//! 4. keepalive tick
//! 5. geometry tick
//!
//! The loop ends on local EOF, remote shutdown or a session fault. The
//! session is shut down exactly once on the way out.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::dispatch::{dispatch, Dispatched, WriteOutcome};
use super::geometry::{GeometrySource, GeometryWatcher};
use super::keepalive::{KeepaliveAction, KeepaliveMonitor};
use super::session::{Session, SessionError};
use crate::config::SessionConfig;
use crate::protocol::{Codec, Message};
use crate::readiness::{Ready, Readiness, Watch};
use crate::transport::{Descriptor, Transport};

/// Local input stream together with the descriptor used to wait on it
pub struct LocalInput<R> {
    reader: R,
    descriptor: Descriptor,
}

impl<R: Read> LocalInput<R> {
    pub fn new(reader: R, descriptor: Descriptor) -> Self {
        Self { reader, descriptor }
    }

    /// Wrap a reader whose descriptor is known by raw value
    pub fn from_raw(reader: R, raw: i32) -> Option<Self> {
        Descriptor::new(raw).map(|descriptor| Self::new(reader, descriptor))
    }

    pub fn descriptor(&self) -> Descriptor {
        self.descriptor
    }
}

#[cfg(unix)]
impl<R: Read + std::os::unix::io::AsRawFd> LocalInput<R> {
    pub fn from_fd(reader: R) -> Option<Self> {
        let raw = reader.as_raw_fd();
        Self::from_raw(reader, raw)
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EndReason {
    /// Local input reached end of stream
    #[default]
    InputClosed,
    /// Local input read failed
    InputFailed(String),
    /// The transport began shutting down
    RemoteShutdown,
    /// Transport, codec or readiness failure
    Fault(String),
}

/// What happened during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub end: EndReason,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub probes_sent: u32,
    pub reconnects_requested: u32,
    pub geometry_updates: u32,
    pub ignored_messages: u32,
    pub abandoned_writes: u32,
}

#[derive(Error, Debug)]
enum LoopError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("readiness wait failed: {0}")]
    Readiness(#[from] io::Error),
}

enum Tick {
    Continue,
    Stop(EndReason),
}

type Clock = Box<dyn FnMut() -> Instant>;

/// Drives one negotiated session until it ends
pub struct SessionOrchestrator<T: Transport, C: Codec, R: Readiness> {
    session: Session<T, C>,
    readiness: R,
    keepalive: KeepaliveMonitor,
    keepalive_interval: Duration,
    geometry: GeometryWatcher,
    poll_timeout: Duration,
    read_chunk_size: usize,
    clock: Clock,
    report: SessionReport,
}

impl<T: Transport, C: Codec, R: Readiness> SessionOrchestrator<T, C, R> {
    pub fn new(session: Session<T, C>, readiness: R, config: &SessionConfig) -> Self {
        let keepalive_interval = config.keepalive_interval();
        Self {
            session,
            readiness,
            keepalive: KeepaliveMonitor::new(keepalive_interval, Instant::now()),
            keepalive_interval,
            geometry: GeometryWatcher::new(),
            poll_timeout: config.poll_timeout(),
            read_chunk_size: config.read_chunk_size(),
            clock: Box::new(Instant::now),
            report: SessionReport::default(),
        }
    }

    /// Replace the time source; the keepalive deadline restarts from it
    pub fn with_clock(mut self, mut clock: impl FnMut() -> Instant + 'static) -> Self {
        self.keepalive = KeepaliveMonitor::new(self.keepalive_interval, clock());
        self.clock = Box::new(clock);
        self
    }

    /// Run until the session ends, then shut it down
    pub fn run<I, O, G>(mut self, mut input: LocalInput<I>, mut output: O, mut geometry: G) -> SessionReport
    where
        I: Read,
        O: Write,
        G: GeometrySource,
    {
        let mut buf = vec![0u8; self.read_chunk_size];
        let end = loop {
            if self.session.is_shutting_down() {
                tracing::info!("Transport is shutting down");
                break EndReason::RemoteShutdown;
            }
            match self.tick(&mut input, &mut output, &mut geometry, &mut buf) {
                Ok(Tick::Continue) => {}
                Ok(Tick::Stop(reason)) => break reason,
                Err(e) => {
                    tracing::warn!("Session loop stopped: {}", e);
                    break EndReason::Fault(e.to_string());
                }
            }
        };

        let Self {
            session,
            mut report,
            ..
        } = self;
        report.end = end;
        session.shutdown();
        tracing::info!(?report, "Session finished");
        report
    }

    fn tick<I: Read, O: Write, G: GeometrySource>(
        &mut self,
        input: &mut LocalInput<I>,
        output: &mut O,
        geometry: &mut G,
        buf: &mut [u8],
    ) -> Result<Tick, LoopError> {
        let transport = self.session.descriptor();
        let mut watches = vec![Watch::input(input.descriptor)];
        if let Some(descriptor) = transport {
            watches.push(Watch::transport(descriptor));
        }
        let ready = self.readiness.wait(&watches, self.poll_timeout)?;

        if ready.contains(Ready::INPUT) {
            match input.reader.read(buf) {
                Ok(0) => {
                    tracing::info!("Local input closed");
                    return Ok(Tick::Stop(EndReason::InputClosed));
                }
                Ok(n) => {
                    self.session.send(&Message::TerminalBuffer(buf[..n].to_vec()))?;
                    self.report.bytes_sent += n as u64;
                    let now = (self.clock)();
                    self.keepalive.record_traffic(now);
                }
                // Retried next tick
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::info!("Local input failed: {}", e);
                    return Ok(Tick::Stop(EndReason::InputFailed(e.to_string())));
                }
            }
        }

        if transport.is_some() && ready.contains(Ready::TRANSPORT) {
            while let Some(message) = self.session.try_receive()? {
                let now = (self.clock)();
                match dispatch(message, output, &mut self.keepalive, now) {
                    Dispatched::Output { len, outcome } => {
                        self.report.bytes_received += len as u64;
                        if let WriteOutcome::Abandoned { .. } = outcome {
                            self.report.abandoned_writes += 1;
                        }
                    }
                    Dispatched::KeepAlive => {}
                    Dispatched::Ignored(_) => self.report.ignored_messages += 1,
                }
            }
        }

        let now = (self.clock)();
        match self.keepalive.tick(now, transport.is_some()) {
            KeepaliveAction::None => {}
            KeepaliveAction::SendProbe => {
                self.session.send(&Message::KeepAlive)?;
                self.report.probes_sent += 1;
            }
            KeepaliveAction::Reconnect => {
                self.session.request_reconnect();
                self.report.reconnects_requested += 1;
            }
        }

        if let Some(changed) = self.geometry.poll(geometry) {
            self.session.send(&Message::TerminalInfo(changed))?;
            self.report.geometry_updates += 1;
        }

        Ok(Tick::Continue)
    }
}
