//! Access to the reader's command-line client.
//!
//! The client is driven one command at a time: `<binary> -c <command> <device>`.
//! Only its stdout is looked at.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::debug;
use std::{
    env,
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::process::Command;

/// Printed by the client when it cannot open the given port.
pub const INVALID_PORT_MARKER: &str = "[!] ERROR: invalid serial port ";

/// Command used to check that a device answers.
pub const PROBE_COMMAND: &str = "help";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReaderClient: Send + Sync {
    /// Resolves the client binary, failing when it is not installed.
    async fn locate(&self) -> Result<PathBuf>;

    /// Returns `false` when the client reports the device as unusable.
    async fn probe(&self, device: &str) -> Result<bool>;

    /// Runs `command` against `device` and returns the client's stdout.
    async fn run(&self, command: &str, device: &str) -> Result<String>;
}

/// Proxmark3 client run as a subprocess.
#[derive(Debug, Clone)]
pub struct Proxmark {
    binary: PathBuf,
}

impl Proxmark {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, command: &str, device: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-c")
            .arg(command)
            .arg(device)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ReaderClient for Proxmark {
    async fn locate(&self) -> Result<PathBuf> {
        find_executable(&self.binary)
            .ok_or_else(|| anyhow!("{} binary not found", self.binary.display()))
    }

    async fn probe(&self, device: &str) -> Result<bool> {
        let output = self.run(PROBE_COMMAND, device).await?;
        Ok(!output.contains(INVALID_PORT_MARKER))
    }

    async fn run(&self, command: &str, device: &str) -> Result<String> {
        let output = self
            .command(command, device)
            .output()
            .await
            .with_context(|| {
                format!(
                    "Failed to run {} -c '{command}' {device}",
                    self.binary.display()
                )
            })?;

        if !output.status.success() {
            debug!("'{command}' exited with {}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Finds `binary` the way a shell would.
///
/// Anything with a directory component is checked as-is; a bare name is
/// searched for on `PATH`.
pub fn find_executable(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return is_executable(binary).then(|| binary.to_path_buf());
    }

    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(binary))
            .find(|candidate| is_executable(candidate))
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
