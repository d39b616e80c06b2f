//! Result types for command execution

use std::time::Duration;

/// Output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status code (0 for success, -1 if killed by a signal)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandOutput {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// First non-empty line of stderr, for error messages
    #[must_use]
    pub fn stderr_summary(&self) -> &str {
        self.stderr
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }
}
