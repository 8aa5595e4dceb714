//! Terminal geometry tracking
//!
//! The watcher reads the local terminal size once per loop tick and reports
//! it to the remote end only when it changes.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::protocol::Geometry;

/// Where the current local geometry comes from
pub trait GeometrySource {
    fn current(&mut self) -> io::Result<Geometry>;
}

impl<G: GeometrySource + ?Sized> GeometrySource for &mut G {
    fn current(&mut self) -> io::Result<Geometry> {
        (**self).current()
    }
}

/// Geometry published by the host, e.g. from a resize handler.
///
/// Clones share the same value. All four fields live in one atomic word so a
/// reader never sees a torn update.
#[derive(Debug, Clone, Default)]
pub struct SharedGeometry {
    packed: Arc<AtomicU64>,
}

impl SharedGeometry {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            packed: Arc::new(AtomicU64::new(pack(geometry))),
        }
    }

    pub fn set(&self, geometry: Geometry) {
        self.packed.store(pack(geometry), Ordering::Release);
    }

    pub fn get(&self) -> Geometry {
        unpack(self.packed.load(Ordering::Acquire))
    }
}

impl GeometrySource for SharedGeometry {
    fn current(&mut self) -> io::Result<Geometry> {
        Ok(self.get())
    }
}

fn pack(g: Geometry) -> u64 {
    (g.rows as u64) << 48
        | (g.columns as u64) << 32
        | (g.pixel_width as u64) << 16
        | g.pixel_height as u64
}

fn unpack(v: u64) -> Geometry {
    Geometry::new((v >> 48) as u16, (v >> 32) as u16, (v >> 16) as u16, v as u16)
}

/// Geometry of the controlling terminal, queried through crossterm
#[derive(Debug, Default)]
pub struct TerminalGeometry;

impl GeometrySource for TerminalGeometry {
    fn current(&mut self) -> io::Result<Geometry> {
        match crossterm::terminal::window_size() {
            Ok(size) => Ok(Geometry::new(size.rows, size.columns, size.width, size.height)),
            // Pixel sizes are not available everywhere
            Err(_) => {
                let (columns, rows) = crossterm::terminal::size()?;
                Ok(Geometry::new(rows, columns, 0, 0))
            }
        }
    }
}

/// Detects geometry changes
#[derive(Debug, Default)]
pub struct GeometryWatcher {
    last_sent: Option<Geometry>,
}

impl GeometryWatcher {
    pub fn new() -> Self {
        Self { last_sent: None }
    }

    /// Read `source` and return the geometry to transmit, if it changed.
    ///
    /// The returned value is recorded as transmitted. A failed read is
    /// skipped and retried on the next tick.
    pub fn poll(&mut self, source: &mut impl GeometrySource) -> Option<Geometry> {
        let geometry = match source.current() {
            Ok(geometry) => geometry,
            Err(e) => {
                tracing::debug!("Geometry unavailable: {}", e);
                return None;
            }
        };

        if self.last_sent == Some(geometry) {
            return None;
        }
        tracing::debug!(
            rows = geometry.rows,
            columns = geometry.columns,
            pixel_width = geometry.pixel_width,
            pixel_height = geometry.pixel_height,
            "Terminal geometry changed"
        );
        self.last_sent = Some(geometry);
        Some(geometry)
    }

    pub fn last_sent(&self) -> Option<Geometry> {
        self.last_sent
    }
}
