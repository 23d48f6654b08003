//! Simulated execution for environments without reachable media hosts
//!
//! The mode is an explicit value chosen by the caller; nothing here looks at
//! process-global state.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::{RemoteExecutor, program_of};

/// Whether remote calls actually reach the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Commands go to the real host
    #[default]
    Live,
    /// Commands are answered with canned output
    Simulated,
}

/// Executor that fakes a freshly installed, empty media host
///
/// Existence probes report `not found` (so writes' read-back reports
/// `exists`), service polls report `active`, listings are empty.
#[derive(Debug, Default)]
pub struct SimulatedExecutor {
    issued: Mutex<Vec<String>>,
}

impl SimulatedExecutor {
    /// Create a simulated executor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far, in order
    #[must_use]
    pub fn issued(&self) -> Vec<String> {
        self.issued
            .lock()
            .map(|cmds| cmds.clone())
            .unwrap_or_default()
    }

    fn respond(cmd: &str) -> &'static str {
        let trimmed = cmd.trim_start();
        if trimmed.starts_with("ls -la") && cmd.contains("echo exists") {
            "exists\n"
        } else if cmd.contains("echo exists") {
            "not found\n"
        } else if trimmed.starts_with("systemctl is-active") {
            "active\n"
        } else {
            ""
        }
    }
}

#[async_trait]
impl RemoteExecutor for SimulatedExecutor {
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        self.run_with_timeout(cmd, Duration::ZERO).await
    }

    #[instrument(skip(self, cmd, _timeout), fields(program = program_of(cmd)), level = "debug")]
    async fn run_with_timeout(
        &self,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        if let Ok(mut issued) = self.issued.lock() {
            issued.push(cmd.to_string());
        }
        debug!("simulating remote command");

        Ok(CommandResult {
            status: 0,
            stdout: Self::respond(cmd).to_string(),
            stderr: String::new(),
            duration: Duration::ZERO,
        })
    }

    fn executor_type(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_responses() {
        let executor = SimulatedExecutor::new();

        let probe = executor
            .exec("test -d '/conf/acct1' && echo exists || echo 'not found'")
            .await
            .unwrap();
        assert_eq!(probe.trim(), "not found");

        let verify = executor
            .exec("ls -la '/conf/acct1/Application.xml' >/dev/null 2>&1 && echo exists || echo 'not found'")
            .await
            .unwrap();
        assert_eq!(verify.trim(), "exists");

        let status = executor
            .exec("systemctl is-active WowzaStreamingEngine || true")
            .await
            .unwrap();
        assert_eq!(status.trim(), "active");

        assert_eq!(executor.issued().len(), 3);
    }

    #[test]
    fn test_mode_from_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: ExecutionMode,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"mode":"simulated"}"#).unwrap();
        assert_eq!(parsed.mode, ExecutionMode::Simulated);
        assert_eq!(ExecutionMode::default(), ExecutionMode::Live);
    }
}
