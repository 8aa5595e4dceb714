//! Inbound message handling

use std::io::{self, Write};
use std::time::Instant;

use super::keepalive::KeepaliveMonitor;
use crate::protocol::{Message, PacketKind};

/// Result of a full write attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Complete,
    /// The output failed after `written` bytes; the rest was dropped
    Abandoned { written: usize },
}

/// Write all of `bytes`, retrying partial writes with the unwritten suffix.
///
/// Stops early on an error or a zero-length write. Output failures do not
/// propagate: only the current message is lost.
pub fn write_fully<W: Write + ?Sized>(output: &mut W, bytes: &[u8]) -> WriteOutcome {
    let mut written = 0;
    while written < bytes.len() {
        match output.write(&bytes[written..]) {
            Ok(0) => {
                tracing::warn!("Local output accepted no bytes, dropping {} bytes", bytes.len() - written);
                return WriteOutcome::Abandoned { written };
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Failed to write to local output: {}", e);
                return WriteOutcome::Abandoned { written };
            }
        }
    }
    if let Err(e) = output.flush() {
        tracing::debug!("Failed to flush local output: {}", e);
    }
    WriteOutcome::Complete
}

/// What dispatching one message did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Output { len: usize, outcome: WriteOutcome },
    KeepAlive,
    Ignored(PacketKind),
}

/// Act on one inbound message
pub fn dispatch<W: Write + ?Sized>(
    message: Message,
    output: &mut W,
    keepalive: &mut KeepaliveMonitor,
    now: Instant,
) -> Dispatched {
    match message {
        Message::TerminalBuffer(bytes) => {
            let outcome = write_fully(output, &bytes);
            keepalive.record_traffic(now);
            Dispatched::Output {
                len: bytes.len(),
                outcome,
            }
        }
        Message::KeepAlive => {
            keepalive.acknowledge();
            Dispatched::KeepAlive
        }
        other => {
            tracing::debug!("Ignoring inbound {} message", other.kind());
            Dispatched::Ignored(other.kind())
        }
    }
}
