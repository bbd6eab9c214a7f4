use donutfs_store::Error as StoreError;

/// Errors returned by filesystem operations.
///
/// Each variant maps to the errno a filesystem bridge would hand back to
/// the kernel; see [`FsError::errno`].
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("No such file or directory: {path}")]
    NotFound { path: String },

    #[error("File exists: {path}")]
    AlreadyExists { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Is a directory: {path}")]
    IsADirectory { path: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("File too large: {path} ({size} bytes)")]
    FileTooLarge { path: String, size: u64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl FsError {
    pub(crate) fn not_found(path: &str) -> Self {
        FsError::NotFound {
            path: path.to_string(),
        }
    }

    /// The errno for this failure.
    ///
    /// Anything the store reports other than a missing key is an I/O error.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound { .. } => libc::ENOENT,
            FsError::AlreadyExists { .. } => libc::EEXIST,
            FsError::NotADirectory { .. } => libc::ENOTDIR,
            FsError::IsADirectory { .. } => libc::EISDIR,
            FsError::InvalidPath { .. } => libc::EINVAL,
            FsError::FileTooLarge { .. } => libc::EFBIG,
            FsError::Store(e) if e.is_not_found() => libc::ENOENT,
            FsError::Store(_) => libc::EIO,
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use donutfs_store::TransportError;

    #[test]
    fn errno_mapping() {
        assert_eq!(FsError::not_found("/a").errno(), libc::ENOENT);
        assert_eq!(
            FsError::AlreadyExists { path: "/a".into() }.errno(),
            libc::EEXIST
        );
        assert_eq!(
            FsError::InvalidPath { path: "a".into() }.errno(),
            libc::EINVAL
        );
        assert_eq!(
            FsError::NotADirectory { path: "/f".into() }.errno(),
            libc::ENOTDIR
        );
        assert_eq!(
            FsError::IsADirectory { path: "/d".into() }.errno(),
            libc::EISDIR
        );
        assert_eq!(
            FsError::FileTooLarge {
                path: "/f".into(),
                size: u64::MAX
            }
            .errno(),
            libc::EFBIG
        );
    }

    #[test]
    fn store_failures_are_io_errors() {
        let e: FsError = StoreError::from(TransportError::NotOpen).into();
        assert_eq!(e.errno(), libc::EIO);

        let e: FsError = StoreError::Remote {
            message: "boom".into(),
        }
        .into();
        assert_eq!(e.errno(), libc::EIO);
        assert_eq!(e.to_string(), "Store error: remote fault: boom");
    }

    #[test]
    fn missing_key_from_store_is_enoent() {
        let e: FsError = StoreError::NotFound { key: "/x".into() }.into();
        assert_eq!(e.errno(), libc::ENOENT);
    }
}
