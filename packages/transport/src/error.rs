//! Error types for the transport layer.
//!
//! Errors at this level are about moving bytes. No RPC semantics like
//! "key not found" - those belong in higher layers.

/// Errors raised by a [`Transport`](crate::Transport).
#[derive(Debug)]
pub enum TransportError {
    /// Underlying socket or file I/O failure.
    Io(std::io::Error),

    /// The transport is not connected.
    NotOpen,

    /// `open` was called on a transport that is already connected.
    AlreadyOpen,

    /// The peer closed the stream before the expected byte count arrived.
    ///
    /// Fatal to the in-flight message. There is no implicit reconnect.
    EndOfStream {
        /// Bytes the caller asked for.
        expected: usize,
        /// Bytes collected before the stream ran dry.
        received: usize,
    },

    /// A frame header carried a length that cannot be a payload size.
    InvalidFrame {
        /// The decoded header value.
        length: i32,
    },

    /// A pending write does not fit in a frame's signed 32-bit length field.
    FrameTooLarge {
        /// Size of the rejected payload.
        length: usize,
    },
}

impl TransportError {
    /// Check if this error means the stream ended early.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, TransportError::EndOfStream { .. })
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "transport i/o error: {}", e),
            TransportError::NotOpen => write!(f, "transport not open"),
            TransportError::AlreadyOpen => write!(f, "transport already open"),
            TransportError::EndOfStream { expected, received } => write!(
                f,
                "end of stream: expected {} bytes, received {}",
                expected, received
            ),
            TransportError::InvalidFrame { length } => {
                write!(f, "invalid frame length: {}", length)
            }
            TransportError::FrameTooLarge { length } => {
                write!(f, "frame too large: {} bytes", length)
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}
