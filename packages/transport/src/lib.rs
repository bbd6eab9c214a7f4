//! DonutFS transports: moving RPC bytes with as few syscalls as possible.
//!
//! This is the bottom of the DonutFS stack. Everything at this level is pure
//! bytes - no request/response semantics, no keys, no files.
//!
//! Transports stack by wrapping:
//!
//! ```text
//! FramedTransport      one length-prefixed frame per flush
//!   BufferedTransport  batch reads and writes
//!     SocketTransport  the actual TCP connection
//! ```
//!
//! # Example
//!
//! ```rust
//! use donutfs_transport::{BufferedTransport, FramedTransport, MemoryTransport, Transport};
//!
//! let mut t = FramedTransport::new(BufferedTransport::new(MemoryTransport::new()));
//! t.write(b"ping").unwrap();
//! t.flush().unwrap();
//!
//! let wire = t.into_inner().into_inner().take_written();
//! assert_eq!(&wire[..], b"\x00\x00\x00\x04ping");
//! ```

pub use bytes::Bytes;

mod buffered;
mod error;
mod framed;
mod memory;
mod socket;
mod traits;

#[cfg(test)]
mod testing;

pub use buffered::BufferedTransport;
pub use error::TransportError;
pub use framed::{encode_frame, FramedTransport, FRAME_HEADER_LEN};
pub use memory::MemoryTransport;
pub use socket::SocketTransport;
pub use traits::Transport;
