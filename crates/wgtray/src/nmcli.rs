//! NetworkManager command-line collaborator.
//!
//! Every read and every mutation goes through `nmcli connection ...`. The
//! [`ConnectionManager`] trait is the seam: [`NmCli`] runs the real binary,
//! tests substitute a recording fake.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use which::which;

use crate::error::NmError;
use crate::parse::{is_uuid, parse_connections, parse_state, ConnectionRecord, StateLine};

/// Abstraction over the external connection-manager tool.
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Runs the tool with `args` to completion and returns its stdout.
    async fn output(&self, args: &[&str]) -> Result<String, NmError>;

    /// Starts the tool with `args` without waiting for it.
    ///
    /// Only a failure to start is reported; the exit status is not observed
    /// by the caller.
    fn spawn(&self, args: &[&str]) -> Result<(), NmError>;
}

#[async_trait]
impl<T: ConnectionManager + ?Sized> ConnectionManager for std::sync::Arc<T> {
    async fn output(&self, args: &[&str]) -> Result<String, NmError> {
        (**self).output(args).await
    }

    fn spawn(&self, args: &[&str]) -> Result<(), NmError> {
        (**self).spawn(args)
    }
}

/// The real `nmcli` binary.
#[derive(Debug, Clone)]
pub struct NmCli {
    pub path: PathBuf,
}

impl NmCli {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locates the `nmcli` binary and returns a configured runner,
    /// or `None` if it cannot be found.
    pub fn locate(user_path: &str) -> Option<Self> {
        locate_nmcli(user_path).map(Self::new)
    }

    fn tool_name(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl ConnectionManager for NmCli {
    async fn output(&self, args: &[&str]) -> Result<String, NmError> {
        log::trace!("Running {} {}", self.tool_name(), args.join(" "));

        let output = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| NmError::Spawn {
                tool: self.tool_name(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(NmError::failed(args, output.status, &output.stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn(&self, args: &[&str]) -> Result<(), NmError> {
        log::debug!("Spawning {} {}", self.tool_name(), args.join(" "));

        // The child is reaped on the ambient runtime.
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| NmError::Spawn {
            tool: self.tool_name(),
            message: e.to_string(),
        })?;

        let mut child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NmError::Spawn {
                tool: self.tool_name(),
                message: e.to_string(),
            })?;

        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        runtime.spawn(async move {
            let stderr = child.stderr.take();
            let status = child.wait().await;
            let mut message = Vec::new();
            if let Some(mut stderr) = stderr {
                use tokio::io::AsyncReadExt;
                let _ = stderr.read_to_end(&mut message).await;
            }
            match status {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    let argv: Vec<&str> = args.iter().map(String::as_str).collect();
                    log::warn!("{}", NmError::failed(&argv, status, &message));
                }
                Err(e) => log::warn!("Failed waiting for '{}': {}", args.join(" "), e),
            }
        });

        Ok(())
    }
}

/// Attempts to locate the `nmcli` executable.
///
/// Resolution order:
/// 1. `user_path` as a literal file path.
/// 2. `user_path` looked up via `PATH`.
/// 3. Common bin directories.
pub fn locate_nmcli(user_path: &str) -> Option<PathBuf> {
    let candidate = Path::new(user_path);
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }

    if let Ok(found) = which(user_path) {
        return Some(found);
    }

    ["/usr/bin", "/bin", "/usr/local/bin", "/usr/sbin"]
        .iter()
        .map(|dir| Path::new(dir).join("nmcli"))
        .find(|p| p.is_file())
}

// ── Typed operations ──────────────────────────────────────────────────────────

/// Lists connections of `type_filter`, in the order nmcli printed them.
pub async fn list_connections<M: ConnectionManager + ?Sized>(
    manager: &M,
    type_filter: &str,
) -> Result<Vec<ConnectionRecord>, NmError> {
    let stdout = manager.output(&["connection", "show"]).await?;
    Ok(parse_connections(&stdout, type_filter))
}

/// Queries the activation state of a single connection.
pub async fn connection_status<M: ConnectionManager + ?Sized>(
    manager: &M,
    uuid: &str,
) -> Result<StateLine, NmError> {
    let stdout = manager.output(&["connection", "show", uuid]).await?;
    Ok(parse_state(&stdout))
}

/// Brings a connection up, fire-and-forget.
pub fn activate<M: ConnectionManager + ?Sized>(manager: &M, uuid: &str) -> Result<(), NmError> {
    manager.spawn(&["connection", "up", uuid])
}

/// Brings a connection down, fire-and-forget.
pub fn deactivate<M: ConnectionManager + ?Sized>(manager: &M, uuid: &str) -> Result<(), NmError> {
    manager.spawn(&["connection", "down", uuid])
}

/// Brings a connection up or down and waits for nmcli to finish.
pub async fn set_active_wait<M: ConnectionManager + ?Sized>(
    manager: &M,
    uuid: &str,
    on: bool,
) -> Result<String, NmError> {
    if !is_uuid(uuid) {
        return Err(NmError::InvalidIdentifier {
            value: uuid.to_string(),
        });
    }
    let verb = if on { "up" } else { "down" };
    manager.output(&["connection", verb, uuid]).await
}
