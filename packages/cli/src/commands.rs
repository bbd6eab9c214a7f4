//! One-shot filesystem commands.
//!
//! Commands:
//! - `ls [path]` - List a directory
//! - `stat <path>` - Show attributes
//! - `mkdir <path>` - Create a directory
//! - `touch <path>` - Create an empty file, or bump its times
//! - `cat <path>` - Print file content
//! - `write <path> [data]` - Write data (or stdin) into a file
//! - `truncate <path> <length>` - Resize a file
//! - `chmod <mode> <path>` - Change permission bits
//! - `rm <path>` / `rmdir <path>` - Remove an entry

use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Subcommand;
use donutfs::{FileAttributes, FsError, HashFs};
use donutfs_store::HashService;

use crate::CliError;

/// Bytes requested per read when printing a file.
const CAT_CHUNK: usize = 64 * 1024;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show the attributes of a file or directory
    Stat { path: String },
    /// Create a directory
    Mkdir {
        path: String,
        /// Permission bits, in octal
        #[arg(short, long, default_value = "755", value_parser = parse_mode)]
        mode: u32,
    },
    /// Create an empty file, or set its times to now if it exists
    Touch {
        path: String,
        /// Permission bits for a new file, in octal
        #[arg(short, long, default_value = "644", value_parser = parse_mode)]
        mode: u32,
    },
    /// Print the content of a file
    Cat { path: String },
    /// Write data into a file, creating it if needed
    Write {
        path: String,
        /// Data to write; read from stdin when omitted
        data: Option<String>,
        /// Byte offset to write at
        #[arg(short, long, default_value_t = 0)]
        offset: u64,
    },
    /// Cut or zero-extend a file
    Truncate { path: String, length: u64 },
    /// Change permission bits
    Chmod {
        #[arg(value_parser = parse_mode)]
        mode: u32,
        path: String,
    },
    /// Remove a file
    Rm { path: String },
    /// Remove a directory (its contents are not checked)
    Rmdir { path: String },
}

/// Parse an octal mode such as `755` or `0o644`.
pub fn parse_mode(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| format!("invalid octal mode: {}", s))
}

/// Run `command` against `fs`, reading stdin-style input from `input` and
/// printing to `out`.
pub fn execute<S: HashService>(
    fs: &mut HashFs<S>,
    command: &Command,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    log::debug!("executing {:?}", command);
    match command {
        Command::Ls { path } => {
            for name in fs.readdir(path)? {
                writeln!(out, "{}", name)?;
            }
        }
        Command::Stat { path } => {
            let attr = fs.getattr(path)?;
            write_stat(out, path, &attr)?;
        }
        Command::Mkdir { path, mode } => fs.mkdir(path, *mode)?,
        Command::Touch { path, mode } => match fs.getattr(path) {
            Ok(_) => fs.utimens(path, None, None)?,
            Err(FsError::NotFound { .. }) => {
                fs.create(path, *mode)?;
            }
            Err(e) => return Err(e.into()),
        },
        Command::Cat { path } => {
            let mut offset = 0u64;
            loop {
                let chunk = fs.read(path, CAT_CHUNK, offset)?;
                if chunk.is_empty() {
                    break;
                }
                out.write_all(&chunk)?;
                offset += chunk.len() as u64;
            }
        }
        Command::Write { path, data, offset } => {
            let data = match data {
                Some(data) => data.clone().into_bytes(),
                None => {
                    let mut buf = Vec::new();
                    input.read_to_end(&mut buf)?;
                    buf
                }
            };
            match fs.getattr(path) {
                Ok(_) => {
                    fs.open(path, 0)?;
                }
                Err(FsError::NotFound { .. }) => {
                    fs.create(path, 0o644)?;
                }
                Err(e) => return Err(e.into()),
            }
            fs.write(path, &data, *offset)?;
            fs.flush(path)?;
        }
        Command::Truncate { path, length } => fs.truncate(path, *length)?,
        Command::Chmod { mode, path } => fs.chmod(path, *mode)?,
        Command::Rm { path } => fs.unlink(path)?,
        Command::Rmdir { path } => fs.rmdir(path)?,
    }
    Ok(())
}

fn write_stat(out: &mut dyn Write, path: &str, attr: &FileAttributes) -> std::io::Result<()> {
    let kind = if attr.is_dir() {
        "directory"
    } else if attr.is_file() {
        "regular file"
    } else {
        "unknown"
    };
    writeln!(out, "  File: {}", path)?;
    writeln!(out, "  Type: {}", kind)?;
    writeln!(out, "  Size: {}", attr.size)?;
    writeln!(out, "  Mode: {:04o}", attr.permissions())?;
    writeln!(out, " Links: {}", attr.nlink)?;
    writeln!(out, "   Uid: {}  Gid: {}", attr.uid, attr.gid)?;
    writeln!(out, "Access: {}", epoch_seconds(attr.atime))?;
    writeln!(out, "Modify: {}", epoch_seconds(attr.mtime))?;
    writeln!(out, "Change: {}", epoch_seconds(attr.ctime))?;
    Ok(())
}

fn epoch_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
