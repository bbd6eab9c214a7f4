//! The hash service RPC surface and its implementations.

use std::collections::BTreeMap;

use bytes::Bytes;
use donutfs_transport::Transport;

use crate::protocol::{BinaryProtocol, Method, Protocol, Reply, Request};
use crate::Error;

/// A flat key-value service addressed by string keys.
///
/// This is the remote surface DonutFS consumes. `get` signals a missing
/// key with [`Error::NotFound`]; every other error is a real failure.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn HashService>`.
pub trait HashService: Send {
    fn get(&mut self, key: &str) -> Result<Bytes, Error>;

    fn put(&mut self, key: &str, value: Bytes) -> Result<(), Error>;

    fn remove(&mut self, key: &str) -> Result<(), Error>;
}

impl<S: HashService + ?Sized> HashService for &mut S {
    fn get(&mut self, key: &str) -> Result<Bytes, Error> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: Bytes) -> Result<(), Error> {
        (**self).put(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        (**self).remove(key)
    }
}

impl<S: HashService + ?Sized> HashService for Box<S> {
    fn get(&mut self, key: &str) -> Result<Bytes, Error> {
        self.as_mut().get(key)
    }

    fn put(&mut self, key: &str, value: Bytes) -> Result<(), Error> {
        self.as_mut().put(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.as_mut().remove(key)
    }
}

/// Calls a remote hash service over a transport.
///
/// One request is in flight at a time: each call writes the request,
/// flushes, and blocks until the matching response has been read. There
/// are no retries; a transport failure surfaces to the caller and leaves
/// the connection unusable.
pub struct RpcClient<T, P = BinaryProtocol> {
    transport: T,
    protocol: P,
    seqid: i32,
}

impl<T: Transport> RpcClient<T> {
    /// Create a client using [`BinaryProtocol`].
    pub fn new(transport: T) -> Self {
        Self::with_protocol(transport, BinaryProtocol::new())
    }
}

impl<T: Transport, P: Protocol> RpcClient<T, P> {
    pub fn with_protocol(transport: T, protocol: P) -> Self {
        Self {
            transport,
            protocol,
            seqid: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn call(&mut self, request: Request) -> Result<Reply, Error> {
        self.seqid = self.seqid.wrapping_add(1);
        let seqid = self.seqid;
        let method = request.method();
        log::debug!("rpc {:?} {} (seqid {})", method, request.key(), seqid);

        self.protocol
            .write_request(&mut self.transport, seqid, &request)?;
        self.transport.flush()?;

        let (got, reply) = self.protocol.read_response(&mut self.transport, method)?;
        if got != seqid {
            return Err(Error::protocol(format!(
                "out of sequence response: expected {}, got {}",
                seqid, got
            )));
        }

        match reply {
            Reply::NotFound(_) => Err(Error::NotFound {
                key: request.key().to_string(),
            }),
            Reply::Fault(message) => {
                log::warn!("remote fault on {:?} {}: {}", method, request.key(), message);
                Err(Error::Remote { message })
            }
            reply => Ok(reply),
        }
    }
}

impl<T: Transport, P: Protocol> HashService for RpcClient<T, P> {
    fn get(&mut self, key: &str) -> Result<Bytes, Error> {
        match self.call(Request::Get {
            key: key.to_string(),
        })? {
            Reply::Value(value) => Ok(value),
            other => Err(Error::protocol(format!("unexpected reply to get: {:?}", other))),
        }
    }

    fn put(&mut self, key: &str, value: Bytes) -> Result<(), Error> {
        self.call(Request::Put {
            key: key.to_string(),
            value,
        })
        .map(|_| ())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.call(Request::Remove {
            key: key.to_string(),
        })
        .map(|_| ())
    }
}

/// A hash service held entirely in memory.
///
/// Useful as a local backend and as a stand-in for the remote service in
/// tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryService {
    data: BTreeMap<String, Bytes>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl HashService for InMemoryService {
    fn get(&mut self, key: &str) -> Result<Bytes, Error> {
        self.data.get(key).cloned().ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })
    }

    fn put(&mut self, key: &str, value: Bytes) -> Result<(), Error> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        match self.data.remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound {
                key: key.to_string(),
            }),
        }
    }
}

/// Answer one request read from `transport` using `service`.
///
/// Service errors become `NotFound`/`Fault` replies. Transport and
/// protocol errors are returned.
pub fn serve_one<T, P, S>(transport: &mut T, protocol: &P, service: &mut S) -> Result<(), Error>
where
    T: Transport,
    P: Protocol + ?Sized,
    S: HashService + ?Sized,
{
    let (seqid, request) = protocol.read_request(&mut *transport)?;
    let result = match request {
        Request::Get { key } => service.get(&key).map(Reply::Value),
        Request::Put { key, value } => service.put(&key, value).map(|_| Reply::Done),
        Request::Remove { key } => service.remove(&key).map(|_| Reply::Done),
    };
    let reply = match result {
        Ok(reply) => reply,
        Err(Error::NotFound { key }) => Reply::NotFound(key),
        Err(e) => Reply::Fault(e.to_string()),
    };
    protocol.write_response(&mut *transport, seqid, &reply)?;
    transport.flush()?;
    Ok(())
}
