//! Where the hash service lives and how to talk to it.

use donutfs_store::RpcClient;
use donutfs_transport::{
    BufferedTransport, FramedTransport, SocketTransport, Transport, TransportError,
};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;

/// Connection parameters for a hash service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Length-prefix every message. The server must be configured the same.
    pub framed: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            framed: false,
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_framing(mut self, framed: bool) -> Self {
        self.framed = framed;
        self
    }

    /// The transport stack for this connection, not yet opened.
    pub fn transport(&self) -> Box<dyn Transport> {
        let buffered = BufferedTransport::new(SocketTransport::new(self.host.clone(), self.port));
        if self.framed {
            Box::new(FramedTransport::new(buffered))
        } else {
            Box::new(buffered)
        }
    }

    /// Open the transport stack and wrap it in an RPC client.
    pub fn connect(&self) -> Result<RpcClient<Box<dyn Transport>>, TransportError> {
        let mut transport = self.transport();
        transport.open()?;
        log::info!(
            "connected to {}:{}{}",
            self.host,
            self.port,
            if self.framed { " (framed)" } else { "" }
        );
        Ok(RpcClient::new(transport))
    }
}
