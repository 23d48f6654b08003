//! Error types for streamprov-exec

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during remote execution
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Failed to reach the remote host
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Host rejected the credential
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Command exited with a non-zero status
    #[error("command execution failed: {status} - {stderr}")]
    CommandFailed {
        /// Exit status code
        status: i32,
        /// Stderr output
        stderr: String,
    },

    /// Connecting or running the command took too long
    #[error("{stage} timed out after {timeout:?}")]
    Timeout {
        /// Which phase exceeded its bound (`connect` or `exec`)
        stage: &'static str,
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// SSH key error
    #[error("SSH key error: {0}")]
    SshKeyError(String),

    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error on the session channel
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Coarse classification used by callers deciding how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    /// Host unreachable, auth rejected, or timed out
    Connection,
    /// Command ran and exited non-zero
    Command,
}

impl ExecError {
    /// Classify the error
    #[must_use]
    pub fn kind(&self) -> ExecErrorKind {
        match self {
            ExecError::CommandFailed { .. } => ExecErrorKind::Command,
            _ => ExecErrorKind::Connection,
        }
    }

    /// Check if the host could not be reached or authenticated
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        self.kind() == ExecErrorKind::Connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let cmd = ExecError::CommandFailed {
            status: 1,
            stderr: "boom".to_string(),
        };
        assert_eq!(cmd.kind(), ExecErrorKind::Command);
        assert!(!cmd.is_connection_error());

        let auth = ExecError::AuthenticationFailed("denied".to_string());
        assert!(auth.is_connection_error());

        let timeout = ExecError::Timeout {
            stage: "connect",
            timeout: Duration::from_secs(30),
        };
        assert!(timeout.is_connection_error());
        assert_eq!(timeout.to_string(), "connect timed out after 30s");
    }
}
