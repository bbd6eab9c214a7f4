//! Read/write batching over another transport.

use bytes::{Bytes, BytesMut};

use crate::{Transport, TransportError};

/// Wraps a transport and buffers its I/O to cut down on syscalls.
///
/// Reads pull at least [`BufferedTransport::DEFAULT_BUFFER`] bytes from the
/// inner transport at a time. Writes are held in memory until
/// [`Transport::flush`], which sends them as a single inner write.
///
/// # Example
///
/// ```rust
/// use donutfs_transport::{BufferedTransport, MemoryTransport, Transport};
///
/// let mut t = BufferedTransport::new(MemoryTransport::new());
/// t.write(b"hello ").unwrap();
/// t.write(b"world").unwrap();
/// assert!(t.get_ref().written().is_empty());
///
/// t.flush().unwrap();
/// assert_eq!(t.get_ref().written(), b"hello world");
/// ```
#[derive(Debug)]
pub struct BufferedTransport<T> {
    inner: T,
    rbuf: Bytes,
    wbuf: BytesMut,
}

impl<T: Transport> BufferedTransport<T> {
    /// Minimum size of a refill read.
    pub const DEFAULT_BUFFER: usize = 4096;

    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rbuf: Bytes::new(),
            wbuf: BytesMut::new(),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the inner transport. Unflushed writes and unread buffered
    /// bytes are dropped.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Bytes queued by `write` but not yet flushed.
    pub fn pending_write_len(&self) -> usize {
        self.wbuf.len()
    }
}

impl<T: Transport> Transport for BufferedTransport<T> {
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
        if len == 0 {
            return Ok(Bytes::new());
        }
        if self.rbuf.is_empty() {
            self.rbuf = self.inner.read(len.max(Self::DEFAULT_BUFFER))?;
        }
        let n = len.min(self.rbuf.len());
        Ok(self.rbuf.split_to(n))
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.wbuf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        // Reset before sending so a failed send is never replayed.
        let out = self.wbuf.split().freeze();
        log::trace!("buffered flush: {} bytes", out.len());
        self.inner.write(&out)?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;
    use proptest::prelude::*;

    #[test]
    fn refill_reads_at_least_default_buffer() {
        let inner = Recorder::with_chunks([&b"abcdefgh"[..]]);
        let mut t = BufferedTransport::new(inner);

        assert_eq!(&t.read(3).unwrap()[..], b"abc");
        assert_eq!(&t.read(3).unwrap()[..], b"def");
        assert_eq!(&t.read(3).unwrap()[..], b"gh");

        // One refill served all three reads.
        assert_eq!(t.get_ref().reads, vec![BufferedTransport::<Recorder>::DEFAULT_BUFFER]);
    }

    #[test]
    fn large_reads_ask_for_the_full_amount() {
        let mut t = BufferedTransport::new(Recorder::default());
        assert!(t.read(10_000).unwrap().is_empty());
        assert_eq!(t.get_ref().reads, vec![10_000]);
    }

    #[test]
    fn read_all_loops_across_refills() {
        let inner = Recorder::with_chunks([&b"he"[..], &b"llo"[..], &b" world"[..]]);
        let mut t = BufferedTransport::new(inner);
        assert_eq!(&t.read_all(11).unwrap()[..], b"hello world");
    }

    #[test]
    fn read_all_fails_on_early_close() {
        let inner = Recorder::with_chunks([&b"hel"[..]]);
        let mut t = BufferedTransport::new(inner);
        let err = t.read_all(5).unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn zero_length_reads_do_no_io() {
        // status, seqid, then a value of length zero
        let inner = Recorder::with_chunks([&b"\x00\x00\x00\x00\x01\x00\x00\x00\x00"[..]]);
        let mut t = BufferedTransport::new(inner);
        assert!(t.read(0).unwrap().is_empty());
        assert!(t.get_ref().reads.is_empty());

        assert_eq!(&t.read_all(1).unwrap()[..], b"\x00");
        assert_eq!(&t.read_all(4).unwrap()[..], b"\x00\x00\x00\x01");
        assert_eq!(&t.read_all(4).unwrap()[..], b"\x00\x00\x00\x00");
        assert!(t.read_all(0).unwrap().is_empty());
        assert!(t.read(0).unwrap().is_empty());

        // The empty trailing field did not ask the peer for more.
        assert_eq!(t.get_ref().reads, vec![BufferedTransport::<Recorder>::DEFAULT_BUFFER]);
    }

    #[test]
    fn writes_are_held_until_flush() {
        let mut t = BufferedTransport::new(Recorder::default());
        t.write(b"one").unwrap();
        t.write(b"two").unwrap();
        assert!(t.get_ref().writes.is_empty());
        assert_eq!(t.pending_write_len(), 6);

        t.flush().unwrap();
        assert_eq!(t.get_ref().writes, vec![b"onetwo".to_vec()]);
        assert_eq!(t.get_ref().flushes, 1);
        assert_eq!(t.pending_write_len(), 0);
    }

    #[test]
    fn failed_flush_does_not_replay() {
        let mut t = BufferedTransport::new(Recorder::default());
        t.write(b"lost").unwrap();
        t.get_mut().fail_writes = true;
        assert!(t.flush().is_err());
        assert_eq!(t.pending_write_len(), 0);

        t.get_mut().fail_writes = false;
        t.write(b"next").unwrap();
        t.flush().unwrap();
        assert_eq!(t.get_ref().writes, vec![b"next".to_vec()]);
    }

    #[test]
    fn open_close_delegate() {
        let mut t = BufferedTransport::new(Recorder::default());
        assert!(!t.is_open());
        t.open().unwrap();
        assert!(t.is_open());
        t.close().unwrap();
        assert!(!t.get_ref().open);
    }

    proptest! {
        #[test]
        fn prop_flush_sends_concatenation_once(
            writes in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..64), 0..16)
        ) {
            let mut t = BufferedTransport::new(Recorder::default());
            for w in &writes {
                t.write(w).unwrap();
            }
            t.flush().unwrap();
            prop_assert_eq!(t.get_ref().writes.len(), 1);
            prop_assert_eq!(&t.get_ref().writes[0], &writes.concat());
        }
    }
}
