//! RPC message encoding for the hash service.
//!
//! The protocol reads and writes messages directly against a
//! [`Transport`], so it works with or without framing underneath. All
//! integers are big-endian.
//!
//! ```text
//! request:  u8 method | i32 seqid | key: i32 len + utf8 | [put] value: i32 len + bytes
//! response: u8 status | i32 seqid | [ok, get] value | [not found, fault] message
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use donutfs_transport::Transport;

use crate::Error;

/// The three remote operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Method {
    Get = 1,
    Put = 2,
    Remove = 3,
}

impl TryFrom<u8> for Method {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self, Error> {
        match tag {
            1 => Ok(Method::Get),
            2 => Ok(Method::Put),
            3 => Ok(Method::Remove),
            other => Err(Error::protocol(format!("unknown method tag {}", other))),
        }
    }
}

/// A call to the hash service.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Get { key: String },
    Put { key: String, value: Bytes },
    Remove { key: String },
}

impl Request {
    pub fn method(&self) -> Method {
        match self {
            Request::Get { .. } => Method::Get,
            Request::Put { .. } => Method::Put,
            Request::Remove { .. } => Method::Remove,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Request::Get { key } | Request::Put { key, .. } | Request::Remove { key } => key,
        }
    }
}

/// The service's answer to a [`Request`].
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Successful `get`.
    Value(Bytes),
    /// Successful `put` or `remove`.
    Done,
    /// The key does not exist.
    NotFound(String),
    /// Any other failure.
    Fault(String),
}

const STATUS_OK: u8 = 0;
const STATUS_NOT_FOUND: u8 = 1;
const STATUS_FAULT: u8 = 2;

/// Encodes requests and decodes responses on a transport.
///
/// The server half (`read_request`/`write_response`) is what a hash
/// service speaks. It lives here so both ends of the contract are defined
/// in one place.
pub trait Protocol: Send {
    fn write_request(
        &self,
        transport: &mut dyn Transport,
        seqid: i32,
        request: &Request,
    ) -> Result<(), Error>;

    /// Read the reply to a `method` call. The method decides the shape of
    /// a successful reply.
    fn read_response(
        &self,
        transport: &mut dyn Transport,
        method: Method,
    ) -> Result<(i32, Reply), Error>;

    fn read_request(&self, transport: &mut dyn Transport) -> Result<(i32, Request), Error>;

    fn write_response(
        &self,
        transport: &mut dyn Transport,
        seqid: i32,
        reply: &Reply,
    ) -> Result<(), Error>;
}

/// Compact binary encoding of hash service messages.
#[derive(Clone, Copy, Debug)]
pub struct BinaryProtocol {
    max_length: usize,
}

impl BinaryProtocol {
    /// Largest key, value or message accepted from the wire by default.
    pub const DEFAULT_MAX_LENGTH: usize = 64 * 1024 * 1024;

    pub fn new() -> Self {
        Self {
            max_length: Self::DEFAULT_MAX_LENGTH,
        }
    }

    /// Reject incoming fields longer than `max_length` bytes.
    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }

    fn put_binary(out: &mut BytesMut, data: &[u8]) -> Result<(), Error> {
        let len = i32::try_from(data.len())
            .map_err(|_| Error::encode(format!("field too large: {} bytes", data.len())))?;
        out.put_i32(len);
        out.extend_from_slice(data);
        Ok(())
    }

    fn read_u8(transport: &mut dyn Transport) -> Result<u8, Error> {
        let b = transport.read_all(1)?;
        Ok(b[0])
    }

    fn read_i32(transport: &mut dyn Transport) -> Result<i32, Error> {
        let b = transport.read_all(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_binary(&self, transport: &mut dyn Transport) -> Result<Bytes, Error> {
        let len = Self::read_i32(transport)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::protocol(format!("negative field length {}", len)))?;
        if len > self.max_length {
            return Err(Error::protocol(format!(
                "field length {} exceeds limit {}",
                len, self.max_length
            )));
        }
        Ok(transport.read_all(len)?)
    }

    fn read_string(&self, transport: &mut dyn Transport) -> Result<String, Error> {
        let raw = self.read_binary(transport)?;
        String::from_utf8(raw.to_vec()).map_err(|e| Error::protocol(e.to_string()))
    }
}

impl Default for BinaryProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for BinaryProtocol {
    fn write_request(
        &self,
        transport: &mut dyn Transport,
        seqid: i32,
        request: &Request,
    ) -> Result<(), Error> {
        let mut out = BytesMut::new();
        out.put_u8(request.method() as u8);
        out.put_i32(seqid);
        Self::put_binary(&mut out, request.key().as_bytes())?;
        if let Request::Put { value, .. } = request {
            Self::put_binary(&mut out, value)?;
        }
        transport.write(&out)?;
        Ok(())
    }

    fn read_response(
        &self,
        transport: &mut dyn Transport,
        method: Method,
    ) -> Result<(i32, Reply), Error> {
        let status = Self::read_u8(transport)?;
        let seqid = Self::read_i32(transport)?;
        let reply = match (status, method) {
            (STATUS_OK, Method::Get) => Reply::Value(self.read_binary(transport)?),
            (STATUS_OK, _) => Reply::Done,
            (STATUS_NOT_FOUND, _) => Reply::NotFound(self.read_string(transport)?),
            (STATUS_FAULT, _) => Reply::Fault(self.read_string(transport)?),
            (other, _) => {
                return Err(Error::protocol(format!("unknown status {}", other)));
            }
        };
        Ok((seqid, reply))
    }

    fn read_request(&self, transport: &mut dyn Transport) -> Result<(i32, Request), Error> {
        let method = Method::try_from(Self::read_u8(transport)?)?;
        let seqid = Self::read_i32(transport)?;
        let key = self.read_string(transport)?;
        let request = match method {
            Method::Get => Request::Get { key },
            Method::Put => Request::Put {
                key,
                value: self.read_binary(transport)?,
            },
            Method::Remove => Request::Remove { key },
        };
        Ok((seqid, request))
    }

    fn write_response(
        &self,
        transport: &mut dyn Transport,
        seqid: i32,
        reply: &Reply,
    ) -> Result<(), Error> {
        let mut out = BytesMut::new();
        match reply {
            Reply::Value(value) => {
                out.put_u8(STATUS_OK);
                out.put_i32(seqid);
                Self::put_binary(&mut out, value)?;
            }
            Reply::Done => {
                out.put_u8(STATUS_OK);
                out.put_i32(seqid);
            }
            Reply::NotFound(message) => {
                out.put_u8(STATUS_NOT_FOUND);
                out.put_i32(seqid);
                Self::put_binary(&mut out, message.as_bytes())?;
            }
            Reply::Fault(message) => {
                out.put_u8(STATUS_FAULT);
                out.put_i32(seqid);
                Self::put_binary(&mut out, message.as_bytes())?;
            }
        }
        transport.write(&out)?;
        Ok(())
    }
}
