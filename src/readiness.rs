//! Event readiness abstraction.
//!
//! The session loop never touches an OS multiplexer directly. It hands a
//! small set of [`Watch`]es and a timeout to a [`Readiness`] implementation
//! and gets back the set of sources that can be read without blocking.

use std::io;
use std::time::Duration;

use bitflags::bitflags;

use crate::transport::Descriptor;

bitflags! {
    /// Readable sources reported by a readiness wait
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ready: u8 {
        /// Local input has bytes (or EOF) to read
        const INPUT = 0b01;
        /// The transport has packets to receive
        const TRANSPORT = 0b10;
    }
}

/// A descriptor to watch and the flag it reports as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    pub descriptor: Descriptor,
    pub source: Ready,
}

impl Watch {
    pub fn input(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            source: Ready::INPUT,
        }
    }

    pub fn transport(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            source: Ready::TRANSPORT,
        }
    }
}

/// Waits until any watched descriptor is readable or the timeout elapses
pub trait Readiness {
    fn wait(&mut self, watches: &[Watch], timeout: Duration) -> io::Result<Ready>;
}

impl<R: Readiness + ?Sized> Readiness for &mut R {
    fn wait(&mut self, watches: &[Watch], timeout: Duration) -> io::Result<Ready> {
        (**self).wait(watches, timeout)
    }
}

/// `poll(2)` backed readiness
#[cfg(unix)]
#[derive(Debug, Default)]
pub struct PollReadiness;

#[cfg(unix)]
impl PollReadiness {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Readiness for PollReadiness {
    fn wait(&mut self, watches: &[Watch], timeout: Duration) -> io::Result<Ready> {
        let mut fds: Vec<libc::pollfd> = watches
            .iter()
            .map(|watch| libc::pollfd {
                fd: watch.descriptor.raw(),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Ready::empty());
            }
            return Err(err);
        }

        // HUP and ERR count as readable so the next read observes EOF or the error.
        // A closed input descriptor (NVAL) does too, so the read fails with EBADF.
        let readable = libc::POLLIN | libc::POLLHUP | libc::POLLERR;
        let mut ready = Ready::empty();
        for (watch, fd) in watches.iter().zip(&fds) {
            let mask = if watch.source.contains(Ready::INPUT) {
                readable | libc::POLLNVAL
            } else {
                readable
            };
            if fd.revents & mask != 0 {
                ready |= watch.source;
            }
        }
        Ok(ready)
    }
}
