//! Error types for streamprov-remote

use streamprov_exec::ExecError;
use thiserror::Error;

/// Errors raised by remote file and service operations
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// Transport or command failure from the executor
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A post-write or post-restart check did not hold
    #[error("verification failed: {0}")]
    Verification(String),

    /// A probe returned something other than its two markers
    #[error("unexpected output from {probe}: {output:?}")]
    UnexpectedOutput {
        /// Which probe ran
        probe: &'static str,
        /// What it printed
        output: String,
    },

    /// Both write strategies failed
    #[error("write to {path} failed (primary: {primary}; fallback: {fallback})")]
    WriteFailed {
        /// Target file
        path: String,
        /// Why the encoded write failed
        primary: String,
        /// Why the literal write failed
        fallback: String,
    },
}

impl RemoteError {
    /// Check if the host could not be reached at all
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, RemoteError::Exec(e) if e.is_connection_error())
    }

    /// Check if this is a failed post-condition
    #[must_use]
    pub fn is_verification(&self) -> bool {
        matches!(self, RemoteError::Verification(_))
    }
}
