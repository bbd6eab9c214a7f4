//! Typed access to a hash service.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Codec, Error, HashService, JsonCodec};

/// Reads and writes structured values on a [`HashService`].
///
/// Values pass through a [`Codec`] on the way in and out. A missing key is
/// not an error here: [`ContentStore::get`] returns `Ok(None)`.
///
/// # Example
///
/// ```rust
/// use donutfs_store::{ContentStore, InMemoryService};
///
/// let mut store = ContentStore::new(InMemoryService::new());
///
/// store.put("/names", &vec!["a".to_string(), "b".to_string()]).unwrap();
/// let names: Option<Vec<String>> = store.get("/names").unwrap();
/// assert_eq!(names.unwrap(), vec!["a", "b"]);
///
/// let missing: Option<Vec<String>> = store.get("/nothing").unwrap();
/// assert!(missing.is_none());
/// ```
pub struct ContentStore<S, C = JsonCodec> {
    service: S,
    codec: C,
}

impl<S: HashService> ContentStore<S> {
    pub fn new(service: S) -> Self {
        Self::with_codec(service, JsonCodec)
    }
}

impl<S: HashService, C: Codec> ContentStore<S, C> {
    pub fn with_codec(service: S, codec: C) -> Self {
        Self { service, codec }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn into_service(self) -> S {
        self.service
    }

    /// Fetch and decode the value under `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The service has no such key.
    /// * `Ok(Some(value))` - The decoded value.
    /// * `Err(Error)` - Transport, remote or decode failure.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, Error> {
        let bytes = match self.service.get(key) {
            Ok(bytes) => bytes,
            Err(Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.codec.decode(&bytes).map(Some)
    }

    /// Encode `value` and store it under `key`, replacing what was there.
    pub fn put<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), Error> {
        let bytes = self.codec.encode(value)?;
        self.service.put(key, bytes)
    }

    /// Delete `key`. Deleting a missing key succeeds.
    pub fn remove(&mut self, key: &str) -> Result<(), Error> {
        match self.service.remove(key) {
            Err(Error::NotFound { .. }) => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryService;
    use bytes::Bytes;

    /// A service whose every call fails remotely.
    struct Broken;

    impl HashService for Broken {
        fn get(&mut self, _key: &str) -> Result<Bytes, Error> {
            Err(Error::Remote {
                message: "down".into(),
            })
        }

        fn put(&mut self, _key: &str, _value: Bytes) -> Result<(), Error> {
            Err(Error::Remote {
                message: "down".into(),
            })
        }

        fn remove(&mut self, _key: &str) -> Result<(), Error> {
            Err(Error::Remote {
                message: "down".into(),
            })
        }
    }

    #[test]
    fn never_written_key_is_none() {
        let mut store = ContentStore::new(InMemoryService::new());
        let got: Option<Vec<u32>> = store.get("/never").unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn put_then_get() {
        let mut store = ContentStore::new(InMemoryService::new());
        store.put("/nums", &[1u32, 2, 3]).unwrap();
        let got: Vec<u32> = store.get("/nums").unwrap().unwrap();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = ContentStore::new(InMemoryService::new());
        store.put("/k", "v").unwrap();
        store.remove("/k").unwrap();
        store.remove("/k").unwrap();
        assert!(store.service().is_empty());
    }

    #[test]
    fn remote_faults_propagate() {
        let mut store = ContentStore::new(Broken);
        assert!(matches!(
            store.get::<String>("/k"),
            Err(Error::Remote { .. })
        ));
        assert!(matches!(store.put("/k", "v"), Err(Error::Remote { .. })));
        assert!(matches!(store.remove("/k"), Err(Error::Remote { .. })));
    }

    #[test]
    fn undecodable_value_is_an_error() {
        let mut svc = InMemoryService::new();
        svc.put("/k", Bytes::from_static(b"\xff\xfe")).unwrap();
        let mut store = ContentStore::new(svc);
        assert!(matches!(
            store.get::<String>("/k"),
            Err(Error::Decode { .. })
        ));
    }
}
