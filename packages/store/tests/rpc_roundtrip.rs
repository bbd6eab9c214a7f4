use std::net::TcpListener;
use std::thread;

use bytes::{Bytes, BytesMut};
use donutfs_store::{
    serve_one, BinaryProtocol, ContentStore, Error, HashService, InMemoryService, RpcClient,
};
use donutfs_transport::{
    BufferedTransport, FramedTransport, MemoryTransport, SocketTransport, Transport,
    TransportError,
};

/// A transport whose peer is an in-process hash service.
///
/// Each flush hands the written frame to the service and queues its framed
/// reply for reading.
struct Loopback<S> {
    service: S,
    inbox: BytesMut,
    outbox: Bytes,
    flushes: usize,
}

impl<S: HashService> Loopback<S> {
    fn new(service: S) -> Self {
        Self {
            service,
            inbox: BytesMut::new(),
            outbox: Bytes::new(),
            flushes: 0,
        }
    }
}

impl<S: HashService> Transport for Loopback<S> {
    fn is_open(&self) -> bool {
        true
    }

    fn open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Bytes, TransportError> {
        let n = len.min(self.outbox.len());
        Ok(self.outbox.split_to(n))
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.inbox.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.flushes += 1;
        let request = self.inbox.split().freeze();
        let mut server = FramedTransport::new(MemoryTransport::from_bytes(request));
        serve_one(&mut server, &BinaryProtocol::new(), &mut self.service)
            .expect("server failed");
        self.outbox = server.into_inner().take_written();
        Ok(())
    }
}

fn client<S: HashService>(service: S) -> RpcClient<FramedTransport<BufferedTransport<Loopback<S>>>> {
    RpcClient::new(FramedTransport::new(BufferedTransport::new(Loopback::new(
        service,
    ))))
}

#[test]
fn put_get_remove_through_the_full_stack() {
    let mut rpc = client(InMemoryService::new());

    rpc.put("/a", Bytes::from_static(b"alpha")).unwrap();
    assert_eq!(&rpc.get("/a").unwrap()[..], b"alpha");

    rpc.remove("/a").unwrap();
    assert!(rpc.get("/a").unwrap_err().is_not_found());

    // One flush (one syscall-sized write) per call.
    let loopback = rpc.transport().get_ref().get_ref();
    assert_eq!(loopback.flushes, 4);
    assert!(loopback.service.is_empty());
}

#[test]
fn empty_key_and_value_survive_the_wire() {
    let mut rpc = client(InMemoryService::new());

    rpc.put("/empty", Bytes::new()).unwrap();
    assert!(rpc.get("/empty").unwrap().is_empty());

    rpc.put("", Bytes::from_static(b"x")).unwrap();
    assert_eq!(&rpc.get("").unwrap()[..], b"x");
}

#[test]
fn content_store_sees_absence_not_faults() {
    let mut store = ContentStore::new(client(InMemoryService::new()));

    let missing: Option<Vec<String>> = store.get("/").unwrap();
    assert!(missing.is_none());

    store.put("/", &Vec::<String>::new()).unwrap();
    let root: Vec<String> = store.get("/").unwrap().unwrap();
    assert!(root.is_empty());

    store.remove("/never-existed").unwrap();
}

/// Rejects every write.
struct ReadOnly(InMemoryService);

impl HashService for ReadOnly {
    fn get(&mut self, key: &str) -> Result<Bytes, Error> {
        self.0.get(key)
    }

    fn put(&mut self, _key: &str, _value: Bytes) -> Result<(), Error> {
        Err(Error::Remote {
            message: "read-only".into(),
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.0.remove(key)
    }
}

#[test]
fn remote_fault_is_reported() {
    let mut rpc = client(ReadOnly(InMemoryService::new()));

    let err = rpc.put("/k", Bytes::from_static(b"v")).unwrap_err();
    assert!(matches!(err, Error::Remote { ref message } if message.contains("read-only")));

    // The connection stays usable after a remote fault.
    assert!(rpc.get("/k").unwrap_err().is_not_found());
}

#[test]
fn talks_to_a_tcp_server() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (conn, _) = listener.accept().unwrap();
        let socket = SocketTransport::from_stream(conn).unwrap();
        let mut transport = FramedTransport::new(BufferedTransport::new(socket));
        let proto = BinaryProtocol::new();
        let mut service = InMemoryService::new();
        loop {
            match serve_one(&mut transport, &proto, &mut service) {
                Ok(()) => {}
                Err(Error::Transport(e)) if e.is_end_of_stream() => break,
                Err(e) => panic!("server error: {}", e),
            }
        }
        service
    });

    let mut transport =
        FramedTransport::new(BufferedTransport::new(SocketTransport::new("127.0.0.1", port)));
    transport.open().unwrap();
    let mut store = ContentStore::new(RpcClient::new(transport));

    store.put("/dir", &vec!["x".to_string()]).unwrap();
    let listing: Vec<String> = store.get("/dir").unwrap().unwrap();
    assert_eq!(listing, vec!["x"]);
    assert!(store.get::<Vec<String>>("/other").unwrap().is_none());

    store.service_mut().transport_mut().close().unwrap();
    let service = server.join().unwrap();
    assert!(service.contains_key("/dir"));
}
