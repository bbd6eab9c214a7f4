//! In-memory byte stream.

use bytes::{Buf, Bytes, BytesMut};

use crate::{Transport, TransportError};

/// A transport backed by memory instead of a socket.
///
/// Reads are served from a fixed byte sequence given at construction.
/// Writes accumulate in a separate buffer that can be inspected with
/// [`MemoryTransport::written`]. Reading never sees written bytes.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    readable: Bytes,
    written: BytesMut,
    closed: bool,
}

impl MemoryTransport {
    /// Create an empty transport (reads report end of stream).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that reads back `data`.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            readable: data.into(),
            ..Self::default()
        }
    }

    /// Everything written so far, flushed or not.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take the written bytes, leaving the buffer empty.
    pub fn take_written(&mut self) -> Bytes {
        self.written.split().freeze()
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.readable.len()
    }
}

impl Transport for MemoryTransport {
    fn is_open(&self) -> bool {
        !self.closed
    }

    fn open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Bytes, TransportError> {
        if self.closed {
            return Err(TransportError::NotOpen);
        }
        let n = len.min(self.readable.remaining());
        Ok(self.readable.split_to(n))
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::NotOpen);
        }
        self.written.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
