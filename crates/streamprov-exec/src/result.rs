//! Result and target types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;
use crate::keys::Credential;

/// Result of a command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit status code (0 for success, -1 if none was reported)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Take stdout, turning a non-zero exit into `ExecError::CommandFailed`
    ///
    /// # Errors
    /// Returns `CommandFailed` carrying the exit status and stderr
    pub fn into_stdout(self) -> Result<String, ExecError> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(ExecError::CommandFailed {
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Connection data for one media host, resolved per operation
#[derive(Debug, Clone)]
pub struct HostTarget {
    /// Host address (IP or DNS name)
    pub address: String,
    /// SSH port
    pub port: u16,
    /// Login user (normally root)
    pub user: String,
    /// Root credential
    pub credential: Credential,
}

impl HostTarget {
    /// Create a target for `root` on port 22
    pub fn new(address: impl Into<String>, credential: Credential) -> Self {
        Self {
            address: address.into(),
            port: 22,
            user: "root".to_string(),
            credential,
        }
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set login user
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Whether the target is this machine
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self.address.as_str(), "localhost" | "127.0.0.1" | "::1")
    }
}

/// Bounds applied to every remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP connect plus authentication
    pub connect: Duration,
    /// Running the command once connected
    pub exec: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            exec: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Secret;

    #[test]
    fn test_into_stdout() {
        let ok = CommandResult {
            status: 0,
            stdout: "exists\n".to_string(),
            stderr: String::new(),
            duration: Duration::from_millis(3),
        };
        assert_eq!(ok.into_stdout().unwrap(), "exists\n");

        let failed = CommandResult {
            status: 2,
            stdout: String::new(),
            stderr: "No such file or directory\n".to_string(),
            duration: Duration::from_millis(3),
        };
        match failed.into_stdout() {
            Err(ExecError::CommandFailed { status, stderr }) => {
                assert_eq!(status, 2);
                assert_eq!(stderr, "No such file or directory");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_host_target_builder() {
        let target = HostTarget::new("10.0.0.5", Credential::Password(Secret::new("pw")))
            .with_port(2222)
            .with_user("admin");
        assert_eq!(target.port, 2222);
        assert_eq!(target.user, "admin");
        assert!(!target.is_local());
        assert!(HostTarget::new("localhost", Credential::Password(Secret::new("x"))).is_local());
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(30));
        assert_eq!(timeouts.exec, Duration::from_secs(60));
    }
}
