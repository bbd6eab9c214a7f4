//! Value serialization for stored records.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Error;

/// Converts structured values to the bytes kept by the hash service and
/// back.
///
/// # Implementing Custom Codecs
///
/// ```rust
/// use donutfs_store::{Codec, Error};
/// use serde::{de::DeserializeOwned, Serialize};
/// use bytes::Bytes;
///
/// struct PrettyJson;
///
/// impl Codec for PrettyJson {
///     fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, Error> {
///         serde_json::to_vec_pretty(value)
///             .map(Bytes::from)
///             .map_err(|e| Error::encode(e.to_string()))
///     }
///
///     fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Error> {
///         serde_json::from_slice(bytes).map_err(|e| Error::decode(e.to_string()))
///     }
/// }
/// ```
pub trait Codec: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, Error>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Error>;
}

/// Stores values as compact JSON.
///
/// Byte payloads should be marked with [`as_base64`] so they encode as a
/// string instead of an array of numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, Error> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| Error::encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::decode(e.to_string()))
    }
}

/// Serde adapter that writes `Bytes` as a base64 string.
///
/// ```rust
/// use bytes::Bytes;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Blob(#[serde(with = "donutfs_store::as_base64")] Bytes);
/// ```
pub mod as_base64 {
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
