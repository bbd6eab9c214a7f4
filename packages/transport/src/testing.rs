//! Test doubles shared by the transport unit tests.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::{Transport, TransportError};

/// Records every call made against it and serves reads from queued chunks.
#[derive(Default)]
pub(crate) struct Recorder {
    pub chunks: VecDeque<Bytes>,
    pub reads: Vec<usize>,
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
    pub fail_writes: bool,
    pub open: bool,
}

impl Recorder {
    pub fn with_chunks<I: IntoIterator<Item = &'static [u8]>>(chunks: I) -> Self {
        Self {
            chunks: chunks.into_iter().map(Bytes::from_static).collect(),
            ..Self::default()
        }
    }

    /// Serve `data` in pieces whose lengths cycle through `sizes`.
    pub fn chunked(data: &[u8], sizes: &[usize]) -> Self {
        let mut chunks = VecDeque::new();
        let mut rest = data;
        let mut sizes = sizes.iter().cycle();
        while !rest.is_empty() {
            let n = sizes.next().map_or(rest.len(), |&n| n.clamp(1, rest.len()));
            chunks.push_back(Bytes::copy_from_slice(&rest[..n]));
            rest = &rest[n..];
        }
        Self {
            chunks,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

impl Transport for Recorder {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<(), TransportError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Bytes, TransportError> {
        self.reads.push(len);
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(Bytes::new());
        };
        if chunk.len() > len {
            let rest = chunk.split_off(len);
            self.chunks.push_front(rest);
        }
        Ok(chunk)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            )));
        }
        self.writes.push(buf.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.flushes += 1;
        Ok(())
    }
}
