//! Raw data readers.
//!
//! A [`Reader`] retrieves the raw text of one probe: the output of an external
//! command or the content of a file. Readers do not enforce a deadline
//! themselves; the collector bounds them, and dropping an in-flight read kills
//! the child process.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::trace;

use crate::error::CollectError;

/// Maximum number of stderr bytes kept in a [`CollectError::CommandFailed`].
const MAX_STDERR_BYTES: usize = 512;

/// Source of raw metric text.
#[async_trait]
pub trait Reader: Send + Sync {
    /// Reads the raw text once.
    async fn read(&self) -> Result<String, CollectError>;

    /// Human-readable description used in logs.
    fn describe(&self) -> String;
}

/// Interpreter used to run a probe command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// `sh -c` with the C locale.
    Sh,
    /// `powershell.exe -Command`.
    PowerShell,
}

/// Runs a shell command and returns its standard output.
#[derive(Debug, Clone)]
pub struct CommandReader {
    shell: Shell,
    command: String,
}

impl CommandReader {
    pub fn new(shell: Shell, command: impl Into<String>) -> Self {
        Self {
            shell,
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn build(&self) -> Command {
        let mut cmd = match self.shell {
            Shell::Sh => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c")
                    .arg(&self.command)
                    .env("LANG", "C")
                    .env("LC_ALL", "C");
                cmd
            }
            Shell::PowerShell => {
                let mut cmd = Command::new("powershell.exe");
                cmd.args(["-NoProfile", "-NonInteractive", "-Command"])
                    .arg(&self.command);
                cmd
            }
        };
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Reader for CommandReader {
    async fn read(&self) -> Result<String, CollectError> {
        trace!(command = %self.command, "running probe command");

        let output = self
            .build()
            .output()
            .await
            .map_err(|source| CollectError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.len() > MAX_STDERR_BYTES {
                let mut cut = MAX_STDERR_BYTES;
                while !stderr.is_char_boundary(cut) {
                    cut -= 1;
                }
                stderr.truncate(cut);
            }
            return Err(CollectError::CommandFailed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn describe(&self) -> String {
        format!("command `{}`", self.command)
    }
}

/// Reads a whole file, typically below /proc.
#[derive(Debug, Clone)]
pub struct FileReader {
    path: PathBuf,
}

impl FileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Reader for FileReader {
    async fn read(&self) -> Result<String, CollectError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CollectError::File {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
