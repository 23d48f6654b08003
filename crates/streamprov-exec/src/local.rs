//! Local command execution using `tokio::process`
//!
//! Used when the media host is the machine running streamprov.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::{RemoteExecutor, program_of};

/// Local command executor
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    /// Default execution bound
    exec_timeout: Duration,
}

impl LocalExecutor {
    /// Create a local executor with the given execution bound
    #[must_use]
    pub fn new(exec_timeout: Duration) -> Self {
        Self { exec_timeout }
    }

    async fn execute(cmd: &str) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        // Use shell to support pipes, redirections, etc.
        let child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::SpawnError(e.to_string()))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        Ok(CommandResult {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        })
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        self.run_with_timeout(cmd, self.exec_timeout).await
    }

    #[instrument(skip(self, cmd), fields(program = program_of(cmd)), level = "debug")]
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout_duration: Duration,
    ) -> Result<CommandResult, ExecError> {
        match timeout(timeout_duration, Self::execute(cmd)).await {
            Ok(Ok(result)) => {
                debug!(
                    status = result.status,
                    duration = ?result.duration,
                    "local command completed"
                );
                Ok(result)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // child is killed when the future is dropped
                error!(timeout = ?timeout_duration, "local command timed out");
                Err(ExecError::Timeout {
                    stage: "exec",
                    timeout: timeout_duration,
                })
            }
        }
    }

    fn executor_type(&self) -> &'static str {
        "local"
    }
}
