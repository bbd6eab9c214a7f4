//! Error types for the store layer.

use donutfs_transport::TransportError;

/// Errors at the store layer.
///
/// These add RPC and serialization failures to the transport errors
/// below.
#[derive(Debug)]
pub enum Error {
    /// The connection failed. Fatal to the in-flight call.
    Transport(TransportError),

    /// The remote service has no value under this key.
    ///
    /// Raised by [`HashService`](crate::HashService) implementations.
    /// [`ContentStore::get`](crate::ContentStore::get) turns it into `None`.
    NotFound { key: String },

    /// The remote service reported a failure.
    Remote { message: String },

    /// A message on the wire was malformed or unexpected.
    Protocol { message: String },

    /// A value could not be serialized.
    Encode { message: String },

    /// Stored bytes could not be deserialized.
    Decode { message: String },
}

impl Error {
    pub fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol {
            message: message.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Error::Encode {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// Check if this is the remote "no such key" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::NotFound { key } => write!(f, "key not found: {}", key),
            Error::Remote { message } => write!(f, "remote fault: {}", message),
            Error::Protocol { message } => write!(f, "protocol error: {}", message),
            Error::Encode { message } => write!(f, "encode error: {}", message),
            Error::Decode { message } => write!(f, "decode error: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn not_found_display() {
        let e = Error::NotFound {
            key: "/a/b".to_string(),
        };
        assert!(format!("{}", e).contains("/a/b"));
        assert!(e.is_not_found());
    }

    #[test]
    fn remote_display() {
        let e = Error::Remote {
            message: "disk full".to_string(),
        };
        assert_eq!(format!("{}", e), "remote fault: disk full");
        assert!(!e.is_not_found());
    }

    #[test]
    fn transport_error_converts_with_source() {
        let e: Error = TransportError::NotOpen.into();
        assert!(matches!(e, Error::Transport(TransportError::NotOpen)));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn other_errors_have_no_source() {
        assert!(StdError::source(&Error::protocol("bad tag")).is_none());
        assert!(StdError::source(&Error::decode("eof")).is_none());
    }
}
