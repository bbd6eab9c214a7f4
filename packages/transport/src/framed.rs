//! Length-prefixed message framing.
//!
//! Every frame on the wire is a 4-byte big-endian signed length followed by
//! exactly that many payload bytes:
//!
//! ```text
//! +----------------+---------------------+
//! | len: i32 (BE)  | payload (len bytes) |
//! +----------------+---------------------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Transport, TransportError};

/// Size of the frame header.
pub const FRAME_HEADER_LEN: usize = 4;

/// Wraps a transport and delimits messages with a length prefix.
///
/// Each [`Transport::flush`] emits everything written since the previous
/// flush as one frame. Reads are served from the current incoming frame;
/// when it runs out the next frame is pulled from the inner transport.
///
/// Either direction can be left unframed for half-duplex peers, see
/// [`FramedTransport::with_framing`].
#[derive(Debug)]
pub struct FramedTransport<T> {
    inner: T,
    /// `None` when read framing is disabled.
    rbuf: Option<Bytes>,
    /// `None` when write framing is disabled.
    wbuf: Option<BytesMut>,
}

impl<T: Transport> FramedTransport<T> {
    /// Frame both directions.
    pub fn new(inner: T) -> Self {
        Self::with_framing(inner, true, true)
    }

    /// Choose which directions are framed. An unframed direction passes
    /// calls straight through to `inner`.
    pub fn with_framing(inner: T, read: bool, write: bool) -> Self {
        Self {
            inner,
            rbuf: read.then(Bytes::new),
            wbuf: write.then(BytesMut::new),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Pull the next frame from the inner transport into the read buffer.
    ///
    /// Any unread bytes of the current frame are discarded.
    pub fn read_frame(&mut self) -> Result<(), TransportError> {
        let header = self.inner.read_all(FRAME_HEADER_LEN)?;
        let length = i32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let size = usize::try_from(length).map_err(|_| TransportError::InvalidFrame { length })?;
        log::trace!("reading frame of {} bytes", size);
        self.rbuf = Some(self.inner.read_all(size)?);
        Ok(())
    }
}

/// Prefix `payload` with its length header.
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, TransportError> {
    let length = i32::try_from(payload.len()).map_err(|_| TransportError::FrameTooLarge {
        length: payload.len(),
    })?;
    let mut out = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.put_i32(length);
    out.extend_from_slice(payload);
    Ok(out.freeze())
}

impl<T: Transport> Transport for FramedTransport<T> {
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn open(&mut self) -> Result<(), TransportError> {
        self.inner.open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close()
    }

    fn read(&mut self, len: usize) -> Result<Bytes, TransportError> {
        let needs_frame = match &self.rbuf {
            None => return self.inner.read(len),
            Some(_) if len == 0 => return Ok(Bytes::new()),
            Some(buf) => buf.is_empty(),
        };
        if needs_frame {
            self.read_frame()?;
        }
        match self.rbuf.as_mut() {
            Some(buf) => {
                let n = len.min(buf.len());
                Ok(buf.split_to(n))
            }
            None => Ok(Bytes::new()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        match self.wbuf.as_mut() {
            Some(wbuf) => {
                wbuf.extend_from_slice(buf);
                Ok(())
            }
            None => self.inner.write(buf),
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        let Some(wbuf) = self.wbuf.as_mut() else {
            return self.inner.flush();
        };
        // Reset before sending so a failed send is never replayed.
        let payload = wbuf.split().freeze();
        let frame = encode_frame(&payload)?;
        log::trace!("writing frame of {} bytes", payload.len());
        // Header and payload in one write: one syscall instead of two.
        self.inner.write(&frame)?;
        self.inner.flush()
    }
}
