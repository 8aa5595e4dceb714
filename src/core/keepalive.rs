//! Keepalive state machine
//!
//! After `interval` without terminal traffic a probe is sent. If a second
//! interval passes without the peer answering, the connection is presumed
//! dead and the transport is asked to reconnect. A silent peer is therefore
//! detected within two intervals.
//!
//! Time is always passed in by the caller.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveState {
    /// No probe outstanding
    Idle,
    /// Probe sent, waiting for the peer's keepalive
    ProbeSent,
}

/// What the caller must do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveAction {
    None,
    SendProbe,
    Reconnect,
}

#[derive(Debug)]
pub struct KeepaliveMonitor {
    interval: Duration,
    deadline: Instant,
    state: KeepaliveState,
}

impl KeepaliveMonitor {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            deadline: now + interval,
            state: KeepaliveState::Idle,
        }
    }

    pub fn state(&self) -> KeepaliveState {
        self.state
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Terminal data moved in either direction
    pub fn record_traffic(&mut self, now: Instant) {
        self.push_deadline(now);
    }

    /// The peer's keepalive arrived
    pub fn acknowledge(&mut self) {
        self.state = KeepaliveState::Idle;
    }

    /// Advance the state machine.
    ///
    /// `transport_available` is false while the transport has no valid
    /// descriptor; no probe can be outstanding then.
    pub fn tick(&mut self, now: Instant, transport_available: bool) -> KeepaliveAction {
        if !transport_available {
            self.state = KeepaliveState::Idle;
            return KeepaliveAction::None;
        }
        if now < self.deadline {
            return KeepaliveAction::None;
        }

        self.push_deadline(now);
        match self.state {
            KeepaliveState::ProbeSent => {
                tracing::warn!("No keepalive answer within {:?}, reconnecting", self.interval);
                self.state = KeepaliveState::Idle;
                KeepaliveAction::Reconnect
            }
            KeepaliveState::Idle => {
                tracing::debug!("Idle for {:?}, sending keepalive probe", self.interval);
                self.state = KeepaliveState::ProbeSent;
                KeepaliveAction::SendProbe
            }
        }
    }

    // The deadline never moves backward
    fn push_deadline(&mut self, now: Instant) {
        self.deadline = self.deadline.max(now + self.interval);
    }
}
