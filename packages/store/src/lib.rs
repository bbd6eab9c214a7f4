//! DonutFS store layer: the hash service and typed values on top of it.
//!
//! This layer turns transport bytes into key-value calls:
//! - `Protocol`/`BinaryProtocol`: request and response encoding
//! - `HashService`: the remote get/put/remove surface
//! - `RpcClient`: a `HashService` that talks over a `Transport`
//! - `ContentStore`: serde-typed reads and writes, with absence as `None`
//!
//! # Example
//!
//! ```rust,no_run
//! use donutfs_store::{ContentStore, RpcClient};
//! use donutfs_transport::{BufferedTransport, FramedTransport, SocketTransport, Transport};
//!
//! let mut transport = FramedTransport::new(BufferedTransport::new(
//!     SocketTransport::new("localhost", 8080),
//! ));
//! transport.open()?;
//!
//! let mut store = ContentStore::new(RpcClient::new(transport));
//! let root: Option<Vec<serde_json::Value>> = store.get("/")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use bytes::Bytes;

mod client;
mod codec;
mod error;
pub mod protocol;
mod service;

pub use client::ContentStore;
pub use codec::{as_base64, Codec, JsonCodec};
pub use error::Error;
pub use protocol::{BinaryProtocol, Protocol};
pub use service::{serve_one, HashService, InMemoryService, RpcClient};

// Re-export transport types for convenience
pub use donutfs_transport::{Transport, TransportError};
