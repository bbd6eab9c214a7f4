//! The core transport trait.

use bytes::{Bytes, BytesMut};

use crate::TransportError;

/// A bidirectional byte stream.
///
/// This is the lowest-level interface in DonutFS. Bytes go in, bytes come
/// out. Nothing here knows about messages, keys or files.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Transport>`.
pub trait Transport: Send {
    /// Check whether the transport is connected.
    fn is_open(&self) -> bool;

    /// Connect the transport.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Disconnect the transport.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Read up to `len` bytes.
    ///
    /// # Returns
    ///
    /// * `Ok(bytes)` with `0 < bytes.len() <= len` - some data arrived.
    /// * `Ok(bytes)` with `bytes.is_empty()` - the stream is exhausted.
    /// * `Err(TransportError)` - the read failed.
    ///
    /// Short reads are normal. Use [`Transport::read_all`] when an exact
    /// count is needed.
    fn read(&mut self, len: usize) -> Result<Bytes, TransportError>;

    /// Read exactly `len` bytes, looping over [`Transport::read`].
    ///
    /// Fails with [`TransportError::EndOfStream`] if a read comes back
    /// empty before `len` bytes were collected. A zero-length read does no
    /// I/O.
    fn read_all(&mut self, len: usize) -> Result<Bytes, TransportError> {
        if len == 0 {
            return Ok(Bytes::new());
        }
        let first = self.read(len)?;
        if first.len() == len {
            return Ok(first);
        }
        if first.is_empty() {
            return Err(TransportError::EndOfStream {
                expected: len,
                received: 0,
            });
        }

        let mut buf = BytesMut::with_capacity(len);
        buf.extend_from_slice(&first);
        while buf.len() < len {
            let chunk = self.read(len - buf.len())?;
            if chunk.is_empty() {
                return Err(TransportError::EndOfStream {
                    expected: len,
                    received: buf.len(),
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Queue bytes for sending. Whether I/O happens here is up to the
    /// implementation.
    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError>;

    /// Push queued bytes to the peer.
    fn flush(&mut self) -> Result<(), TransportError>;
}

// Blanket implementations for references and boxes

impl<T: Transport + ?Sized> Transport for &mut T {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn read(&mut self, len: usize) -> Result<Bytes, TransportError> {
        (**self).read(len)
    }

    fn read_all(&mut self, len: usize) -> Result<Bytes, TransportError> {
        (**self).read_all(len)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn is_open(&self) -> bool {
        self.as_ref().is_open()
    }

    fn open(&mut self) -> Result<(), TransportError> {
        self.as_mut().open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.as_mut().close()
    }

    fn read(&mut self, len: usize) -> Result<Bytes, TransportError> {
        self.as_mut().read(len)
    }

    fn read_all(&mut self, len: usize) -> Result<Bytes, TransportError> {
        self.as_mut().read_all(len)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.as_mut().write(buf)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.as_mut().flush()
    }
}
