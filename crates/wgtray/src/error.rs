use std::process::ExitStatus;
use std::time::Duration;

/// High-level error category for UI display purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The connection-manager tool is missing or could not be started
    Tool,
    /// The tool ran but reported failure
    Command,
    /// Rejected before anything was run (bad identifier, bad path)
    Input,
}

/// Errors returned when talking to the connection-manager tool.
#[derive(Debug, Clone)]
pub enum NmError {
    /// The binary could not be located on this system.
    NotFound {
        tool: String,
    },

    /// The process could not be spawned at all.
    Spawn {
        tool: String,
        message: String,
    },

    /// The process ran and exited unsuccessfully.
    Failed {
        args: Vec<String>,
        status: Option<i32>,
        stderr: String,
    },

    InvalidIdentifier {
        value: String,
    },

    /// The process did not answer within the allowed time.
    TimedOut {
        args: Vec<String>,
        after: Duration,
    },
}

impl NmError {
    /// Builds a [`NmError::Failed`] from a finished process.
    pub fn failed(args: &[&str], status: ExitStatus, stderr: &[u8]) -> Self {
        NmError::Failed {
            args: args.iter().map(|a| a.to_string()).collect(),
            status: status.code(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Returns the high-level category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            NmError::NotFound { .. } | NmError::Spawn { .. } => ErrorCategory::Tool,
            NmError::Failed { .. } | NmError::TimedOut { .. } => ErrorCategory::Command,
            NmError::InvalidIdentifier { .. } => ErrorCategory::Input,
        }
    }

    /// Returns the user-facing error message
    pub fn user_message(&self) -> String {
        match self {
            NmError::NotFound { tool } => {
                format!(
                    "Could not locate '{}'.\n\nIs NetworkManager installed?",
                    tool
                )
            }
            NmError::Spawn { tool, message } => {
                format!("Failed to start '{}'.\n\n{}", tool, message)
            }
            NmError::Failed {
                args,
                status,
                stderr,
            } => {
                let code = status
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                if stderr.is_empty() {
                    format!("'{}' exited with {}", args.join(" "), code)
                } else {
                    format!("'{}' exited with {}: {}", args.join(" "), code, stderr)
                }
            }
            NmError::InvalidIdentifier { value } => {
                format!("'{}' is not a connection UUID", value)
            }
            NmError::TimedOut { args, after } => {
                format!("'{}' did not answer within {:?}", args.join(" "), after)
            }
        }
    }
}

impl std::fmt::Display for NmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for NmError {}
