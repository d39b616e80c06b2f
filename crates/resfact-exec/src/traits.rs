//! Command runner trait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandOutput;

/// Runs a program with arguments and captures its output
///
/// A non-zero exit status is not an error at this level; callers inspect
/// [`CommandOutput::success`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ExecError>;

    /// Run `program`, giving up after `timeout`
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, ExecError>;

    /// Short name of the runner, for logging
    fn runner_type(&self) -> &'static str;
}
