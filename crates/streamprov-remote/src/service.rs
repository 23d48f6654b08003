//! Service Controller for the media server unit

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use streamprov_exec::RemoteExecutor;
use tracing::{debug, info, instrument, warn};

use crate::commands;
use crate::error::RemoteError;
use crate::types::{ACTIVE, ServiceStatus};

/// Lifecycle control of the managed service on one host
#[async_trait]
pub trait ServiceController: Send + Sync {
    /// Unit name being managed
    fn unit(&self) -> &str;

    async fn stop(&self) -> Result<(), RemoteError>;

    /// Restart, wait out the grace delay, then require the unit to be active
    ///
    /// # Errors
    /// `Verification` if the unit is not active after the grace delay
    async fn restart(&self) -> Result<(), RemoteError>;

    /// Current unit state word
    async fn state(&self) -> Result<String, RemoteError>;

    /// State plus version banner
    async fn status(&self) -> Result<ServiceStatus, RemoteError>;
}

/// systemd-managed service
pub struct SystemdController {
    executor: Arc<dyn RemoteExecutor>,
    unit: String,
    grace: Duration,
    version_command: Option<String>,
}

impl SystemdController {
    pub fn new(executor: Arc<dyn RemoteExecutor>, unit: impl Into<String>, grace: Duration) -> Self {
        Self {
            executor,
            unit: unit.into(),
            grace,
            version_command: None,
        }
    }

    /// Command whose first output line is the server version
    #[must_use]
    pub fn with_version_command(mut self, cmd: impl Into<String>) -> Self {
        self.version_command = Some(cmd.into());
        self
    }

    async fn version(&self) -> Option<String> {
        let cmd = self.version_command.as_deref()?;
        match self.executor.exec(cmd).await {
            Ok(out) => out
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string),
            Err(e) => {
                debug!(error = %e, "version banner unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl ServiceController for SystemdController {
    fn unit(&self) -> &str {
        &self.unit
    }

    #[instrument(skip(self), fields(unit = %self.unit))]
    async fn stop(&self) -> Result<(), RemoteError> {
        self.executor.exec(&commands::service_stop(&self.unit)).await?;
        info!("service stopped");
        Ok(())
    }

    #[instrument(skip(self), fields(unit = %self.unit))]
    async fn restart(&self) -> Result<(), RemoteError> {
        self.executor
            .exec(&commands::service_restart(&self.unit))
            .await?;

        if !self.grace.is_zero() {
            tokio::time::sleep(self.grace).await;
        }

        let state = self.state().await?;
        if state != ACTIVE {
            warn!(%state, "service not active after restart");
            return Err(RemoteError::Verification(format!(
                "{} is {state} after restart",
                self.unit
            )));
        }

        info!("service restarted");
        Ok(())
    }

    async fn state(&self) -> Result<String, RemoteError> {
        let out = self
            .executor
            .exec(&commands::service_is_active(&self.unit))
            .await?;
        Ok(out.trim().to_string())
    }

    async fn status(&self) -> Result<ServiceStatus, RemoteError> {
        let state = self.state().await?;
        let version = self.version().await;
        Ok(ServiceStatus::from_state(state).with_version(version))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use streamprov_exec::{CommandResult, ExecError};

    use super::*;

    struct StateHost {
        state: &'static str,
        issued: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteExecutor for StateHost {
        async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
            self.run_with_timeout(cmd, Duration::ZERO).await
        }

        async fn run_with_timeout(
            &self,
            cmd: &str,
            _timeout: Duration,
        ) -> Result<CommandResult, ExecError> {
            self.issued.lock().unwrap().push(cmd.to_string());
            let stdout = if cmd.starts_with("systemctl is-active") {
                format!("{}\n", self.state)
            } else if cmd.contains("-version") {
                "\nWowza Streaming Engine 4.8.0\nmore\n".to_string()
            } else {
                String::new()
            };
            Ok(CommandResult {
                status: 0,
                stdout,
                stderr: String::new(),
                duration: Duration::ZERO,
            })
        }

        fn executor_type(&self) -> &'static str {
            "state"
        }
    }

    fn host(state: &'static str) -> Arc<StateHost> {
        Arc::new(StateHost {
            state,
            issued: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_restart_polls_after_restart() {
        let executor = host("active");
        let controller = SystemdController::new(executor.clone(), "WowzaStreamingEngine", Duration::ZERO);

        controller.restart().await.unwrap();

        let issued = executor.issued.lock().unwrap();
        assert_eq!(
            *issued,
            [
                "systemctl restart WowzaStreamingEngine",
                "systemctl is-active WowzaStreamingEngine || true",
            ]
        );
    }

    #[tokio::test]
    async fn test_restart_inactive_is_verification_error() {
        let controller = SystemdController::new(host("failed"), "WowzaStreamingEngine", Duration::ZERO);

        let err = controller.restart().await.unwrap_err();
        assert!(err.is_verification());
        assert!(err.to_string().contains("WowzaStreamingEngine is failed"));
    }

    #[tokio::test]
    async fn test_restart_waits_grace() {
        let controller = SystemdController::new(host("active"), "svc", Duration::from_millis(50));

        let start = std::time::Instant::now();
        controller.restart().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_status_with_version() {
        let controller = SystemdController::new(host("active"), "svc", Duration::ZERO)
            .with_version_command("/opt/bin/startup.sh -version 2>/dev/null | head -1");

        let status = controller.status().await.unwrap();
        assert!(status.running);
        assert_eq!(status.version.as_deref(), Some("Wowza Streaming Engine 4.8.0"));
    }
}
