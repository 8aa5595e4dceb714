//! Scripted collaborators for unit tests.
//!
//! Everything here is in-memory: a transport whose state tests can inspect
//! after handing it to a session, a readiness waiter that replays a script,
//! and local I/O doubles with controllable chunking.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::core::geometry::GeometrySource;
use crate::protocol::{Codec, CodecError, Geometry, Message, Packet, PacketKind};
use crate::readiness::{Ready, Readiness, Watch};
use crate::transport::{Credentials, Descriptor, Endpoint, Transport, TransportError, TransportResult};

/// Byte layout used only by the tests
#[derive(Debug, Clone, Copy, Default)]
pub struct TestCodec;

impl Codec for TestCodec {
    fn encode(&self, message: &Message) -> Result<Packet, CodecError> {
        let payload = match message {
            Message::InitialPayload { jumphost } => vec![*jumphost as u8],
            Message::InitialResponse { error: None } => Vec::new(),
            Message::InitialResponse { error: Some(error) } => {
                let mut payload = vec![1];
                payload.extend_from_slice(error.as_bytes());
                payload
            }
            Message::TerminalBuffer(bytes) => bytes.clone(),
            Message::TerminalInfo(g) => [g.rows, g.columns, g.pixel_width, g.pixel_height]
                .iter()
                .flat_map(|v| v.to_be_bytes())
                .collect(),
            Message::KeepAlive => Vec::new(),
            Message::Other(packet) => return Ok(packet.clone()),
        };
        Ok(Packet::new(message.kind(), payload))
    }

    fn decode(&self, packet: Packet) -> Result<Message, CodecError> {
        let kind = packet.kind();
        let malformed = |reason: &str| CodecError::Malformed {
            kind,
            reason: reason.to_string(),
        };
        let message = match kind {
            PacketKind::INITIAL_PAYLOAD => match packet.payload() {
                [flag] => Message::InitialPayload { jumphost: *flag != 0 },
                _ => return Err(malformed("expected one byte")),
            },
            PacketKind::INITIAL_RESPONSE => match packet.payload() {
                [] => Message::InitialResponse { error: None },
                [1, rest @ ..] => Message::InitialResponse {
                    error: Some(String::from_utf8_lossy(rest).into_owned()),
                },
                _ => return Err(malformed("bad error marker")),
            },
            PacketKind::TERMINAL_BUFFER => Message::TerminalBuffer(packet.into_payload()),
            PacketKind::TERMINAL_INFO => {
                let bytes = packet.payload();
                if bytes.len() != 8 {
                    return Err(malformed("expected 8 bytes"));
                }
                let field = |i: usize| u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
                Message::TerminalInfo(Geometry::new(field(0), field(1), field(2), field(3)))
            }
            PacketKind::KEEP_ALIVE => Message::KeepAlive,
            _ => Message::Other(packet),
        };
        Ok(message)
    }
}

/// Observable state of a [`MockTransport`]
#[derive(Debug)]
pub struct MockState {
    /// Results of successive `open` calls; `true` once exhausted
    pub open_results: VecDeque<bool>,
    /// Messages queued as inbound after each successful open
    pub responses_on_open: VecDeque<Vec<Packet>>,
    pub open_calls: u32,
    pub fail_open: bool,
    pub fail_send: bool,
    pub fail_receive: bool,
    pub inbound: VecDeque<Packet>,
    pub sent: Vec<Packet>,
    pub descriptor: Option<Descriptor>,
    pub shutting_down: bool,
    pub reconnects: u32,
    pub shutdowns: u32,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            open_results: VecDeque::new(),
            responses_on_open: VecDeque::new(),
            open_calls: 0,
            fail_open: false,
            fail_send: false,
            fail_receive: false,
            inbound: VecDeque::new(),
            sent: Vec::new(),
            descriptor: Descriptor::new(7),
            shutting_down: false,
            reconnects: 0,
            shutdowns: 0,
        }
    }
}

/// Shared view of a mock transport's state
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn push_inbound(&self, message: &Message) {
        let packet = TestCodec.encode(message).unwrap();
        self.state().inbound.push_back(packet);
    }

    /// Queue `messages` to arrive after the next successful open
    pub fn respond_on_open(&self, messages: &[Message]) {
        let packets = messages.iter().map(|m| TestCodec.encode(m).unwrap()).collect();
        self.state().responses_on_open.push_back(packets);
    }

    /// Everything sent so far, decoded
    pub fn sent_messages(&self) -> Vec<Message> {
        self.state()
            .sent
            .iter()
            .map(|p| TestCodec.decode(p.clone()).unwrap())
            .collect()
    }

    pub fn set_descriptor(&self, descriptor: Option<Descriptor>) {
        self.state().descriptor = descriptor;
    }
}

/// In-memory transport
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: self.state.clone(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, _endpoint: &Endpoint, _credentials: &Credentials) -> TransportResult<bool> {
        let mut state = self.state();
        state.open_calls += 1;
        if state.fail_open {
            return Err(TransportError::Closed);
        }
        let opened = state.open_results.pop_front().unwrap_or(true);
        if opened {
            if let Some(packets) = state.responses_on_open.pop_front() {
                state.inbound.extend(packets);
            }
        }
        Ok(opened)
    }

    fn send(&mut self, packet: Packet) -> TransportResult<()> {
        let mut state = self.state();
        if state.fail_send {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock send failure",
            )));
        }
        state.sent.push(packet);
        Ok(())
    }

    fn try_receive(&mut self) -> TransportResult<Option<Packet>> {
        let mut state = self.state();
        if state.fail_receive {
            return Err(TransportError::Other(anyhow::anyhow!("mock receive failure")));
        }
        Ok(state.inbound.pop_front())
    }

    fn descriptor(&self) -> Option<Descriptor> {
        self.state().descriptor
    }

    fn is_shutting_down(&self) -> bool {
        self.state().shutting_down
    }

    fn request_reconnect(&mut self) {
        self.state().reconnects += 1;
    }

    fn shutdown(&mut self) {
        let mut state = self.state();
        state.shutdowns += 1;
        state.shutting_down = true;
    }
}

type WaitHook = Box<dyn FnMut(usize)>;

/// Readiness that replays a fixed sequence of results.
///
/// Each wait pops the next step (empty once exhausted) and reports only the
/// sources that were actually watched.
pub struct ScriptedReadiness {
    steps: VecDeque<Ready>,
    /// Watches passed to every wait, in order
    pub waits: Vec<Vec<Watch>>,
    hook: Option<WaitHook>,
}

impl ScriptedReadiness {
    pub fn new(steps: impl IntoIterator<Item = Ready>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            waits: Vec::new(),
            hook: None,
        }
    }

    /// Run `hook` with the wait index before each wait returns
    pub fn with_hook(mut self, hook: impl FnMut(usize) + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }
}

impl Readiness for ScriptedReadiness {
    fn wait(&mut self, watches: &[Watch], _timeout: Duration) -> io::Result<Ready> {
        let index = self.waits.len();
        self.waits.push(watches.to_vec());
        if let Some(hook) = self.hook.as_mut() {
            hook(index);
        }
        let watched = watches.iter().fold(Ready::empty(), |acc, w| acc | w.source);
        let step = self.steps.pop_front().unwrap_or(Ready::empty());
        Ok(step & watched)
    }
}

/// Local input that yields queued chunks, then EOF
#[derive(Debug, Default)]
pub struct ScriptedInput {
    chunks: VecDeque<io::Result<Vec<u8>>>,
    pub reads: usize,
}

impl ScriptedInput {
    pub fn new(chunks: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Ok).collect(),
            reads: 0,
        }
    }

    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.chunks.push_back(Err(io::Error::new(kind, "scripted input error")));
    }
}

impl Read for ScriptedInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        match self.chunks.pop_front() {
            None => Ok(0),
            Some(Err(e)) => Err(e),
            Some(Ok(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.chunks.push_front(Ok(chunk.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

/// Local output that accepts at most a scripted number of bytes per call
#[derive(Debug, Default)]
pub struct ChunkedWriter {
    limits: VecDeque<usize>,
    pub written: Vec<u8>,
    pub calls: Vec<usize>,
    pub fail: bool,
    pub flushes: usize,
}

impl ChunkedWriter {
    pub fn new(limits: impl IntoIterator<Item = usize>) -> Self {
        Self {
            limits: limits.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Write for ChunkedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write error"));
        }
        let limit = self.limits.pop_front().unwrap_or(usize::MAX);
        let n = limit.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        self.calls.push(n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Geometry source replaying observations, repeating the last one
#[derive(Debug)]
pub struct ScriptedGeometry {
    observations: VecDeque<io::Result<Geometry>>,
    last: Geometry,
}

impl ScriptedGeometry {
    pub fn new(observations: impl IntoIterator<Item = Geometry>) -> Self {
        Self {
            observations: observations.into_iter().map(Ok).collect(),
            last: Geometry::default(),
        }
    }

    pub fn push_error(&mut self) {
        self.observations
            .push_back(Err(io::Error::new(io::ErrorKind::Other, "no terminal")));
    }
}

impl GeometrySource for ScriptedGeometry {
    fn current(&mut self) -> io::Result<Geometry> {
        match self.observations.pop_front() {
            Some(Ok(geometry)) => {
                self.last = geometry;
                Ok(geometry)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last),
        }
    }
}
