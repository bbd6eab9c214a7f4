//! Hierarchical filesystem operations on a flat hash service.
//!
//! Every path is a key. A directory's key holds the list of its children
//! with their attributes; a file's key holds its bytes. Attributes live
//! only in the parent listing, so any attribute change rewrites the parent.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use donutfs_store::{ContentStore, Error as StoreError, HashService};

use crate::attr::{Directory, DirectoryEntry, FileAttributes, FileContent, Owner};
use crate::error::{FsError, Result};
use crate::path::{locate, normalize, ROOT};
use crate::write_buffer::{StagedFile, WriteBuffer};

/// Permission bits reported for the root, which has no stored entry.
const ROOT_PERMISSIONS: u32 = 0o777;

/// A filesystem backed by a [`HashService`].
///
/// File contents are staged in a [`WriteBuffer`] on first read or write
/// and only reach the service on [`flush`](HashFs::flush) or
/// [`destroy`](HashFs::destroy).
///
/// # Example
///
/// ```rust
/// use donutfs::HashFs;
/// use donutfs_store::InMemoryService;
///
/// let mut fs = HashFs::new(InMemoryService::new());
/// fs.init().unwrap();
///
/// fs.mkdir("/docs", 0o755).unwrap();
/// fs.create("/docs/note", 0o644).unwrap();
/// fs.write("/docs/note", b"hello", 0).unwrap();
/// fs.flush("/docs/note").unwrap();
///
/// assert_eq!(fs.getattr("/docs/note").unwrap().size, 5);
/// assert_eq!(&fs.read("/docs/note", 5, 0).unwrap()[..], b"hello");
/// ```
pub struct HashFs<S> {
    store: ContentStore<S>,
    write_buffer: WriteBuffer,
    next_handle: u64,
    owner: Owner,
}

impl<S: HashService> HashFs<S> {
    /// Create a filesystem whose new entries belong to this process.
    pub fn new(service: S) -> Self {
        Self::with_owner(service, Owner::current())
    }

    pub fn with_owner(service: S, owner: Owner) -> Self {
        Self {
            store: ContentStore::new(service),
            write_buffer: WriteBuffer::new(),
            next_handle: 0,
            owner,
        }
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn store(&self) -> &ContentStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContentStore<S> {
        &mut self.store
    }

    pub fn write_buffer(&self) -> &WriteBuffer {
        &self.write_buffer
    }

    /// Give back the service. Staged data that was not flushed is dropped.
    pub fn into_service(self) -> S {
        self.store.into_service()
    }

    /// Make sure the root directory exists.
    pub fn init(&mut self) -> Result<()> {
        if self.store.get::<Directory>(ROOT)?.is_none() {
            log::info!("initializing empty root directory");
            self.store.put(ROOT, &Directory::new())?;
        }
        Ok(())
    }

    /// Permission checks are left to the caller's mount options.
    pub fn access(&mut self, _path: &str, _mask: i32) -> Result<()> {
        Ok(())
    }

    /// Attributes of `path`.
    ///
    /// The root's attributes are synthesized. A file with unflushed writes
    /// reports its staged length as its size.
    pub fn getattr(&mut self, path: &str) -> Result<FileAttributes> {
        let path = normalize(path)?;
        if path == ROOT {
            let mut attr = FileAttributes::directory(ROOT_PERMISSIONS, self.owner);
            attr.nlink = 1;
            return Ok(attr);
        }

        let loc = locate(path)?;
        let parent = match self.load_directory(loc.parent) {
            Ok(dir) => dir,
            Err(FsError::NotFound { .. }) => return Err(FsError::not_found(path)),
            Err(e) => return Err(e),
        };
        let mut attr = parent
            .find(loc.name)
            .map(|entry| entry.attr.clone())
            .ok_or_else(|| FsError::not_found(path))?;

        if let Some(file) = self.write_buffer.get(path).filter(|f| f.is_dirty()) {
            attr.size = file.len() as u64;
        }
        Ok(attr)
    }

    /// Names in the directory at `path`, led by `.` and `..`.
    pub fn readdir(&mut self, path: &str) -> Result<Vec<String>> {
        let path = normalize(path)?;
        let dir = self.load_directory(path)?;

        let mut names = Vec::with_capacity(dir.len() + 2);
        names.push(".".to_string());
        names.push("..".to_string());
        names.extend(dir.names().map(str::to_string));
        Ok(names)
    }

    pub fn mkdir(&mut self, path: &str, mode: u32) -> Result<()> {
        let attr = FileAttributes::directory(mode, self.owner);
        self.add_entry(path, attr, &Directory::new())?;
        log::debug!("mkdir {} ({:o})", path, mode);
        Ok(())
    }

    /// Create an empty regular file and return a handle for it.
    pub fn create(&mut self, path: &str, mode: u32) -> Result<u64> {
        let attr = FileAttributes::file(mode, self.owner);
        self.add_entry(path, attr, &FileContent::default())?;
        let handle = self.allocate_handle();
        log::debug!("create {} ({:o}) -> handle {}", path, mode, handle);
        Ok(handle)
    }

    /// Remove `path`: its key, its entry in the parent and any staged data.
    pub fn unlink(&mut self, path: &str) -> Result<()> {
        let loc = locate(path)?;
        let mut parent = self.load_directory(loc.parent)?;
        if parent.find(loc.name).is_none() {
            return Err(FsError::not_found(loc.path));
        }

        self.store.remove(loc.path)?;
        parent.remove(loc.name);
        self.store.put(loc.parent, &parent)?;
        self.write_buffer.remove(loc.path);
        log::debug!("unlink {}", loc.path);
        Ok(())
    }

    /// Same as [`unlink`](HashFs::unlink). Children of a removed directory
    /// are left behind in the store.
    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        self.unlink(path)
    }

    pub fn chmod(&mut self, path: &str, mode: u32) -> Result<()> {
        self.update_entry(path, |attr| attr.set_permissions(mode))
    }

    /// Change ownership. `None` leaves that id unchanged.
    pub fn chown(&mut self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        self.update_entry(path, |attr| {
            if let Some(uid) = uid {
                attr.uid = uid;
            }
            if let Some(gid) = gid {
                attr.gid = gid;
            }
        })
    }

    /// Set access and modification times. `None` means now.
    ///
    /// Times before the Unix epoch are stored as the epoch.
    pub fn utimens(
        &mut self,
        path: &str,
        atime: Option<SystemTime>,
        mtime: Option<SystemTime>,
    ) -> Result<()> {
        let now = SystemTime::now();
        self.update_entry(path, |attr| {
            attr.atime = atime.unwrap_or(now).max(UNIX_EPOCH);
            attr.mtime = mtime.unwrap_or(now).max(UNIX_EPOCH);
        })
    }

    /// Cut or zero-extend the stored content to `length` bytes.
    pub fn truncate(&mut self, path: &str, length: u64) -> Result<()> {
        let path = normalize(path)?;
        let len = usize::try_from(length).map_err(|_| FsError::FileTooLarge {
            path: path.to_string(),
            size: length,
        })?;

        let mut data = self.load_content(path)?;
        data.resize(len, 0);
        self.store.put(path, &FileContent::from(data))?;

        if let Some(file) = self.write_buffer.get_mut(path) {
            file.resize(len);
        }

        let now = SystemTime::now();
        self.update_entry(path, |attr| {
            attr.size = length;
            attr.mtime = now;
        })?;
        log::debug!("truncate {} to {}", path, length);
        Ok(())
    }

    /// Hand out a handle. Content is loaded lazily by read and write.
    pub fn open(&mut self, path: &str, flags: i32) -> Result<u64> {
        let path = normalize(path)?;
        let handle = self.allocate_handle();
        log::debug!("open {} (flags {:#x}) -> handle {}", path, flags, handle);
        Ok(handle)
    }

    /// Up to `size` bytes starting at `offset`.
    ///
    /// The first read of a path stages its stored content. A read at offset
    /// zero reloads a staged copy that has no unflushed writes.
    pub fn read(&mut self, path: &str, size: usize, offset: u64) -> Result<Bytes> {
        let path = normalize(path)?;
        if offset == 0 && !self.write_buffer.is_dirty(path) {
            self.write_buffer.remove(path);
        }

        let file = self.stage(path)?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(Bytes::copy_from_slice(file.slice(offset, size)))
    }

    /// Write `data` at `offset` into the staged copy of `path`.
    ///
    /// Bytes past the written range are kept and a gap past the end is
    /// zero-filled. Nothing is sent to the store until flush.
    pub fn write(&mut self, path: &str, data: &[u8], offset: u64) -> Result<usize> {
        let path = normalize(path)?;
        let offset = offset
            .checked_add(data.len() as u64)
            .and_then(|end| usize::try_from(end).ok())
            .map(|end| end - data.len())
            .ok_or_else(|| FsError::FileTooLarge {
                path: path.to_string(),
                size: offset.saturating_add(data.len() as u64),
            })?;

        self.stage(path)?.write_at(offset, data);
        Ok(data.len())
    }

    /// Persist staged writes for `path` and record the new size.
    ///
    /// A staged copy without writes is dropped. If the store rejects the
    /// content the staged copy is kept.
    pub fn flush(&mut self, path: &str) -> Result<()> {
        let path = normalize(path)?;
        let Some(file) = self.write_buffer.get(path) else {
            return Ok(());
        };
        if !file.is_dirty() {
            self.write_buffer.remove(path);
            return Ok(());
        }

        let size = file.len() as u64;
        let content = FileContent(Bytes::copy_from_slice(file.data()));
        self.store.put(path, &content)?;
        self.write_buffer.remove(path);

        let now = SystemTime::now();
        self.update_entry(path, |attr| {
            attr.size = size;
            attr.mtime = now;
        })?;
        log::info!("flushed {} ({} bytes)", path, size);
        Ok(())
    }

    /// Flush every staged file, as on unmount.
    ///
    /// Every path is attempted. The first failure is returned.
    pub fn destroy(&mut self) -> Result<()> {
        let paths = self.write_buffer.paths();
        log::info!("destroy: flushing {} staged file(s)", paths.len());

        let mut first_error = None;
        for path in paths {
            if let Err(e) = self.flush(&path) {
                log::warn!("failed to flush {}: {}", path, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn allocate_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// The listing stored under `path`. A value that does not decode as a
    /// listing belongs to a file.
    fn load_directory(&mut self, path: &str) -> Result<Directory> {
        match self.store.get(path) {
            Ok(Some(dir)) => Ok(dir),
            Ok(None) => Err(FsError::not_found(path)),
            Err(StoreError::Decode { .. }) => Err(FsError::NotADirectory {
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// The bytes stored under `path`. A value that does not decode as
    /// content belongs to a directory.
    fn load_content(&mut self, path: &str) -> Result<Vec<u8>> {
        match self.store.get::<FileContent>(path) {
            Ok(Some(content)) => Ok(content.0.to_vec()),
            Ok(None) => Err(FsError::not_found(path)),
            Err(StoreError::Decode { .. }) => Err(FsError::IsADirectory {
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// The staged copy of `path`, loading it from the store if needed.
    fn stage(&mut self, path: &str) -> Result<&mut StagedFile> {
        if !self.write_buffer.contains(path) {
            let data = self.load_content(path)?;
            log::debug!("staged {} ({} bytes)", path, data.len());
            self.write_buffer.load(path, data);
        }
        self.write_buffer
            .get_mut(path)
            .ok_or_else(|| FsError::not_found(path))
    }

    /// List a new entry in its parent, then write its initial value.
    fn add_entry<T: serde::Serialize>(
        &mut self,
        path: &str,
        attr: FileAttributes,
        initial: &T,
    ) -> Result<()> {
        let loc = locate(path)?;
        let mut parent = self.load_directory(loc.parent)?;
        let entry = DirectoryEntry {
            name: loc.name.to_string(),
            attr,
        };
        if !parent.insert(entry) {
            return Err(FsError::AlreadyExists {
                path: loc.path.to_string(),
            });
        }

        self.store.put(loc.parent, &parent)?;
        self.store.put(loc.path, initial)?;
        Ok(())
    }

    /// Read-modify-write the attributes of `path` in its parent listing.
    fn update_entry<F>(&mut self, path: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut FileAttributes),
    {
        let loc = locate(path)?;
        let mut parent = self.load_directory(loc.parent)?;
        let entry = parent
            .find_mut(loc.name)
            .ok_or_else(|| FsError::not_found(loc.path))?;
        update(&mut entry.attr);
        self.store.put(loc.parent, &parent)?;
        Ok(())
    }
}
