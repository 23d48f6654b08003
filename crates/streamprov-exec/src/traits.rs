//! Remote executor trait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs one shell command per call against a single host
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run a command with the executor's default execution bound
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError>;

    /// Run a command with an explicit execution bound
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;

    /// Short name for logs
    fn executor_type(&self) -> &'static str;

    /// Run a command and return its stdout
    ///
    /// # Errors
    /// Returns `ExecError::CommandFailed` on non-zero exit, or the transport
    /// error if the command could not be run at all
    async fn exec(&self, cmd: &str) -> Result<String, ExecError> {
        self.run(cmd).await?.into_stdout()
    }
}

/// First word of a command, safe to log
///
/// Full command lines can carry passwords or encoded artifact bodies.
#[must_use]
pub fn program_of(cmd: &str) -> &str {
    cmd.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_of() {
        assert_eq!(program_of("echo 'acct1:pw' | chpasswd"), "echo");
        assert_eq!(program_of("  systemctl restart x"), "systemctl");
        assert_eq!(program_of(""), "");
    }
}
