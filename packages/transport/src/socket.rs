//! TCP byte stream.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::Bytes;

use crate::{Transport, TransportError};

/// A blocking TCP connection to an RPC server.
///
/// Unbuffered: every `read` and `write` is a syscall. Wrap it in a
/// [`BufferedTransport`](crate::BufferedTransport).
#[derive(Debug)]
pub struct SocketTransport {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl SocketTransport {
    /// Create an unconnected socket for `host:port`. Call
    /// [`Transport::open`] to connect.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stream: None,
        }
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        let peer = stream.peer_addr()?;
        Ok(Self {
            host: peer.ip().to_string(),
            port: peer.port(),
            stream: Some(stream),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn stream(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl Transport for SocketTransport {
    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn open(&mut self) -> Result<(), TransportError> {
        if self.stream.is_some() {
            return Err(TransportError::AlreadyOpen);
        }
        log::debug!("connecting to {}:{}", self.host, self.port);
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(stream) = self.stream.take() {
            log::debug!("closing connection to {}:{}", self.host, self.port);
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                // Peer already hung up.
                Err(e) if e.kind() == ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Bytes, TransportError> {
        let stream = self.stream()?;
        let mut buf = vec![0u8; len];
        loop {
            match stream.read(&mut buf) {
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Bytes::from(buf));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.stream()?.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.stream()?.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn unopened_socket_rejects_io() {
        let mut t = SocketTransport::new("127.0.0.1", 1);
        assert!(!t.is_open());
        assert!(matches!(t.read(1), Err(TransportError::NotOpen)));
        assert!(matches!(t.write(b"x"), Err(TransportError::NotOpen)));
        assert!(t.close().is_ok());
    }

    #[test]
    fn echoes_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            conn.read_exact(&mut buf).unwrap();
            conn.write_all(&buf).unwrap();
        });

        let mut t = SocketTransport::new("127.0.0.1", port);
        t.open().unwrap();
        assert!(matches!(t.open(), Err(TransportError::AlreadyOpen)));

        t.write(b"hello").unwrap();
        t.flush().unwrap();
        assert_eq!(&t.read_all(5).unwrap()[..], b"hello");

        server.join().unwrap();
        t.close().unwrap();
        assert!(!t.is_open());
    }
}
