//! # donutfs-cli
//!
//! Run single DonutFS operations against a remote hash service.
//!
//! Each invocation connects, makes sure the root directory exists, runs one
//! command, flushes anything staged, and disconnects.
//!
//! ## Usage
//!
//! ```bash
//! donutfs --host store.local --port 8080 mkdir /docs
//! echo "hello" | donutfs write /docs/note
//! donutfs cat /docs/note
//! donutfs -vv --framed ls /docs
//! ```

pub mod commands;
pub mod config;

use std::io;

use donutfs::{FsError, HashFs};
use donutfs_transport::{Transport, TransportError};

pub use commands::{execute, Command};
pub use config::ConnectionConfig;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Fs(#[from] FsError),

    #[error("connection failed: {0}")]
    Connect(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Connect per `config` and run `command`, using the process's stdin and
/// stdout.
pub fn run(config: &ConnectionConfig, command: &Command) -> Result<(), CliError> {
    let client = config.connect()?;
    let mut fs = HashFs::new(client);
    fs.init()?;

    let result = execute(
        &mut fs,
        command,
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
    );
    let flushed = fs.destroy();

    let mut client = fs.into_service();
    if let Err(e) = client.transport_mut().close() {
        log::debug!("error closing connection: {}", e);
    }

    result?;
    flushed?;
    Ok(())
}
