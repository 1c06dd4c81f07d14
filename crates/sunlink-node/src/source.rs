//! Telemetry byte sources.
//!
//! The run loop drains whatever bytes a source has available each round; the
//! serial line is the timing master and the node never requests data. On
//! hardware the source wraps a UART receive buffer; on the host a captured
//! stream is replayed in UART-sized chunks.

use std::fs;
use std::path::Path;

/// Bytes handed to the parser per replay round, sized like a UART receive
/// buffer drain.
pub const DEFAULT_CHUNK: usize = 64;

/// Producer of raw telemetry bytes.
pub trait TelemetrySource {
    /// Copy available bytes into `buf` and return how many were written.
    /// Returning zero means nothing is available right now.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// True once the source will never produce bytes again. Live serial
    /// sources never exhaust.
    fn exhausted(&self) -> bool {
        false
    }
}

/// Replays a captured byte stream in bounded chunks.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ReplaySource {
    pub fn new(data: Vec<u8>) -> Self {
        ReplaySource {
            data,
            pos: 0,
            chunk: DEFAULT_CHUNK,
        }
    }

    /// Read a captured stream from a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(ReplaySource::new(fs::read(path)?))
    }

    /// Set the maximum bytes yielded per read.
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl TelemetrySource for ReplaySource {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = self.chunk.min(buf.len()).min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}
