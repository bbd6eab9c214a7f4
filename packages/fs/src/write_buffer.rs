//! Client-side staging of file contents between open and flush.

use std::collections::HashMap;

/// The working copy of one file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagedFile {
    data: Vec<u8>,
    dirty: bool,
}

impl StagedFile {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True once the copy differs from what was loaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bytes in `[offset, offset + size)`, clipped to the end of the data.
    pub fn slice(&self, offset: usize, size: usize) -> &[u8] {
        let start = offset.min(self.data.len());
        let end = start.saturating_add(size).min(self.data.len());
        &self.data[start..end]
    }

    /// Overwrite `data.len()` bytes at `offset`.
    ///
    /// Bytes past the written range are kept. Writing past the end
    /// zero-fills the gap.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) {
        let end = offset + data.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(data);
        self.dirty = true;
    }

    /// Cut or zero-extend to `len` bytes.
    pub fn resize(&mut self, len: usize) {
        self.data.resize(len, 0);
    }
}

/// Per-path working copies, keyed by content key.
///
/// Nothing here is durable. Entries reach the store only when the
/// translator flushes them.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    files: HashMap<String, StagedFile>,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a clean copy of stored content, replacing any existing entry.
    pub fn load(&mut self, path: &str, data: Vec<u8>) -> &mut StagedFile {
        let file = self.files.entry(path.to_string()).or_default();
        *file = StagedFile { data, dirty: false };
        file
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&StagedFile> {
        self.files.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut StagedFile> {
        self.files.get_mut(path)
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.files.get(path).is_some_and(StagedFile::is_dirty)
    }

    pub fn remove(&mut self, path: &str) -> Option<StagedFile> {
        self.files.remove(path)
    }

    /// Staged paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
