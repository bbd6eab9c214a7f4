//! DonutFS: a hierarchical filesystem on a flat key-value hash service.
//!
//! Paths are keys. Directory keys hold their child listings, including
//! each child's attributes. File keys hold raw content. [`HashFs`]
//! exposes the operations a filesystem bridge dispatches to, and reports
//! failures as [`FsError`] with an errno for the kernel.
//!
//! ```text
//! HashFs ─▶ ContentStore ─▶ RpcClient ─▶ FramedTransport ─▶ BufferedTransport ─▶ socket
//! ```
//!
//! Writes are staged per path in a [`WriteBuffer`] and persisted on
//! [`HashFs::flush`] or [`HashFs::destroy`].

pub mod attr;
mod error;
pub mod path;
mod translator;
mod write_buffer;

pub use attr::{Directory, DirectoryEntry, FileAttributes, FileContent, Owner};
pub use error::{FsError, Result};
pub use translator::HashFs;
pub use write_buffer::{StagedFile, WriteBuffer};
