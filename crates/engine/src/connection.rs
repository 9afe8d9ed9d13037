//! Connections to the scanned target
//!
//! Compute functions reach the target only through a [`Connection`]. The
//! engine does not establish connections; it is handed one per runtime.
//! Capabilities a connection does not offer answer with a `Connection` error.

use chrono::{DateTime, Utc};
use factgraph_core::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Metadata of a file on the target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileInfo {
    /// Size in bytes
    pub size: u64,
    /// Whether the path is a directory
    pub is_dir: bool,
    /// Last modification time, if known
    pub modified: Option<DateTime<Utc>>,
}

/// Result of running a command on the target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
    /// Exit status
    pub exit_status: i32,
}

/// Capability handle for one target
pub trait Connection: Send + Sync + fmt::Debug {
    /// Connection ID
    fn id(&self) -> u32;

    /// Parent connection whose resources this connection shares
    fn parent_id(&self) -> Option<u32> {
        None
    }

    /// Display name of the target
    fn name(&self) -> &str;

    /// Read a whole file
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Err(unsupported(self.name(), "reading files", path))
    }

    /// Stat a path; `Ok(None)` if it does not exist
    fn stat(&self, path: &str) -> Result<Option<FileInfo>> {
        Err(unsupported(self.name(), "stat", path))
    }

    /// Run a command and capture its output
    fn run_command(&self, command: &str) -> Result<CommandOutput> {
        Err(unsupported(self.name(), "running commands", command))
    }

    /// Release the connection
    fn close(&self) {}
}

fn unsupported(name: &str, capability: &str, target: &str) -> Error {
    Error::Connection(format!(
        "connection '{name}' does not support {capability} (requested for '{target}')"
    ))
}

/// Connection to the local machine
#[derive(Debug)]
pub struct LocalConnection {
    id: u32,
    parent_id: Option<u32>,
    name: String,
}

impl LocalConnection {
    /// Create a local connection
    pub fn new(id: u32) -> Self {
        LocalConnection {
            id,
            parent_id: None,
            name: "local".to_string(),
        }
    }

    /// Share the registry of `parent`
    pub fn with_parent(mut self, parent: u32) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Connection for LocalConnection {
    fn id(&self) -> u32 {
        self.id
    }

    fn parent_id(&self) -> Option<u32> {
        self.parent_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| Error::Connection(format!("failed to read '{path}': {e}")))
    }

    fn stat(&self, path: &str) -> Result<Option<FileInfo>> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(FileInfo {
                size: meta.len(),
                is_dir: meta.is_dir(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Connection(format!("failed to stat '{path}': {e}"))),
        }
    }

    fn run_command(&self, command: &str) -> Result<CommandOutput> {
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| Error::Connection(format!("failed to run '{command}': {e}")))?;
        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_status: output.status.code().unwrap_or(-1),
        })
    }

    fn close(&self) {
        debug!(target: "factgraph::connection", id = self.id, "Local connection closed");
    }
}

/// In-memory connection with fixed files and command outputs.
///
/// Counts every capability call, which lets callers check that an answer
/// came from somewhere else (a recording, a cached slot).
#[derive(Debug, Default)]
pub struct MemoryConnection {
    id: u32,
    parent_id: Option<u32>,
    name: String,
    files: HashMap<String, Vec<u8>>,
    commands: HashMap<String, CommandOutput>,
    accesses: AtomicUsize,
    closed: AtomicBool,
    log: Mutex<Vec<String>>,
}

impl MemoryConnection {
    /// Create an empty in-memory connection
    pub fn new(id: u32) -> Self {
        MemoryConnection {
            id,
            name: "memory".to_string(),
            ..Default::default()
        }
    }

    /// Share the registry of `parent`
    pub fn with_parent(mut self, parent: u32) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Add a file
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Add a command and its output
    pub fn with_command(mut self, command: impl Into<String>, output: CommandOutput) -> Self {
        self.commands.insert(command.into(), output);
        self
    }

    /// Number of capability calls so far
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Capability calls so far, in order (`"read_file /etc/hosts"`, ...)
    pub fn access_log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn touch(&self, capability: &str, target: &str) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(format!("{capability} {target}"));
    }
}

impl Connection for MemoryConnection {
    fn id(&self) -> u32 {
        self.id
    }

    fn parent_id(&self) -> Option<u32> {
        self.parent_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.touch("read_file", path);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Connection(format!("file '{path}' not found")))
    }

    fn stat(&self, path: &str) -> Result<Option<FileInfo>> {
        self.touch("stat", path);
        Ok(self.files.get(path).map(|content| FileInfo {
            size: content.len() as u64,
            is_dir: false,
            modified: None,
        }))
    }

    fn run_command(&self, command: &str) -> Result<CommandOutput> {
        self.touch("run_command", command);
        self.commands
            .get(command)
            .cloned()
            .ok_or_else(|| Error::Connection(format!("command '{command}' not available")))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
