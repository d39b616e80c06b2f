//! Error types for resfact-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a command
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Program is not installed or not on `PATH`
    #[error("program not found: {0}")]
    NotFound(String),

    /// Program exists but may not be executed by this user
    #[error("permission denied running {0}")]
    PermissionDenied(String),

    /// Process spawn error
    #[error("failed to spawn {program}: {message}")]
    SpawnError {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        message: String,
    },

    /// I/O error while collecting output
    #[error("I/O error: {0}")]
    IoError(String),

    /// Command timed out
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },
}

impl ExecError {
    pub(crate) fn from_spawn(program: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ExecError::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                ExecError::PermissionDenied(program.to_string())
            }
            _ => ExecError::SpawnError {
                program: program.to_string(),
                message: err.to_string(),
            },
        }
    }
}
