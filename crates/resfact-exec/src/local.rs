//! Local command execution using `tokio::process`

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::result::CommandOutput;
use crate::traits::CommandRunner;

/// Local command runner
///
/// Executes programs directly (no shell) on the local machine, with
/// `LC_ALL=C` so their output is parseable.
#[derive(Debug, Clone)]
pub struct LocalRunner;

impl LocalRunner {
    /// Create a new local runner
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, args), level = "debug")]
    async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ExecError> {
        let start = Instant::now();

        debug!(program, ?args, "running command");

        let child = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::from_spawn(program, &e))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();
        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(program, status, duration = ?duration, "command completed");

        Ok(CommandOutput {
            status,
            stdout,
            stderr,
            duration,
        })
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ExecError> {
        self.execute(program, args).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout_duration: Duration,
    ) -> Result<CommandOutput, ExecError> {
        match timeout(timeout_duration, self.execute(program, args)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(program, timeout = ?timeout_duration, "command timed out");
                Err(ExecError::Timeout {
                    timeout: timeout_duration,
                })
            }
        }
    }

    fn runner_type(&self) -> &'static str {
        "local"
    }
}
