//! Stored metadata: attributes, directory entries, file content.

use std::time::SystemTime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Mask of the file type bits in a mode.
pub const S_IFMT: u32 = libc::S_IFMT as u32;
/// Directory type bits.
pub const S_IFDIR: u32 = libc::S_IFDIR as u32;
/// Regular file type bits.
pub const S_IFREG: u32 = libc::S_IFREG as u32;
/// Mask of the permission bits (including setuid/setgid/sticky).
pub const PERMISSION_BITS: u32 = 0o7777;

/// Who new entries belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Owner {
    pub uid: u32,
    pub gid: u32,
}

impl Owner {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// The user and group of this process.
    pub fn current() -> Self {
        // SAFETY: getuid/getgid cannot fail and touch no memory.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self { uid, gid }
    }
}

/// The `stat` fields DonutFS keeps for every entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Type bits and permission bits.
    pub mode: u32,
    pub nlink: u32,
    pub size: u64,
    pub ctime: SystemTime,
    pub mtime: SystemTime,
    pub atime: SystemTime,
    pub uid: u32,
    pub gid: u32,
}

impl FileAttributes {
    /// Attributes for a new, empty directory.
    pub fn directory(permissions: u32, owner: Owner) -> Self {
        Self::new(S_IFDIR | (permissions & PERMISSION_BITS), 2, owner)
    }

    /// Attributes for a new, empty regular file.
    pub fn file(permissions: u32, owner: Owner) -> Self {
        Self::new(S_IFREG | (permissions & PERMISSION_BITS), 1, owner)
    }

    fn new(mode: u32, nlink: u32, owner: Owner) -> Self {
        let now = SystemTime::now();
        Self {
            mode,
            nlink,
            size: 0,
            ctime: now,
            mtime: now,
            atime: now,
            uid: owner.uid,
            gid: owner.gid,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    pub fn permissions(&self) -> u32 {
        self.mode & PERMISSION_BITS
    }

    /// Replace the permission bits, keeping the type bits.
    pub fn set_permissions(&mut self, permissions: u32) {
        self.mode = (self.mode & S_IFMT) | (permissions & PERMISSION_BITS);
    }
}

/// One named child of a directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub attr: FileAttributes,
}

/// The stored value of a directory: its children, in creation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut DirectoryEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Append `entry`. Returns `false` and leaves the directory untouched if
    /// the name is taken.
    pub fn insert(&mut self, entry: DirectoryEntry) -> bool {
        if self.find(&entry.name).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<DirectoryEntry> {
        let index = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(index))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The stored value of a regular file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileContent(#[serde(with = "donutfs_store::as_base64")] pub Bytes);

impl From<Vec<u8>> for FileContent {
    fn from(data: Vec<u8>) -> Self {
        FileContent(Bytes::from(data))
    }
}
