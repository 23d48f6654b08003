//! Core error types for streamprov-core

use serde::Serialize;
use streamprov_exec::{ExecError, ExecErrorKind};
use streamprov_inventory::InventoryError;
use streamprov_remote::RemoteError;
use streamprov_template::TemplateError;
use thiserror::Error;

/// Errors surfaced by reconciliation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ReconcileError {
    /// Host unreachable, authentication refused, or a bound exceeded
    #[error("connection error: {0}")]
    Connection(String),

    /// A remote command exited non-zero or printed nonsense
    #[error("command error: {0}")]
    Command(String),

    /// A post-write or post-restart check did not hold
    #[error("verification error: {0}")]
    Verification(String),

    /// Host absent from inventory, or a required artifact absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Tenant data cannot be provisioned as given
    #[error("invalid tenant: {0}")]
    InvalidTenant(String),

    /// Actor communication error
    #[error("actor communication error: {0}")]
    Actor(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ReconcileError {
    #[must_use]
    pub fn is_verification(&self) -> bool {
        matches!(self, ReconcileError::Verification(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound(_))
    }
}

impl From<ExecError> for ReconcileError {
    fn from(e: ExecError) -> Self {
        match e.kind() {
            ExecErrorKind::Connection => ReconcileError::Connection(e.to_string()),
            ExecErrorKind::Command => ReconcileError::Command(e.to_string()),
        }
    }
}

impl From<RemoteError> for ReconcileError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Exec(inner) => inner.into(),
            RemoteError::Verification(msg) => ReconcileError::Verification(msg),
            other @ (RemoteError::UnexpectedOutput { .. } | RemoteError::WriteFailed { .. }) => {
                ReconcileError::Command(other.to_string())
            }
        }
    }
}

impl From<InventoryError> for ReconcileError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::HostNotFound(_) | InventoryError::TenantNotFound(_) => {
                ReconcileError::NotFound(e.to_string())
            }
            InventoryError::MissingCredential(_) => ReconcileError::Config(e.to_string()),
            InventoryError::Store(_) => ReconcileError::Connection(e.to_string()),
        }
    }
}

impl From<TemplateError> for ReconcileError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::PropertyNotFound(_) => ReconcileError::NotFound(e.to_string()),
            TemplateError::MalformedProperty(_) => ReconcileError::Command(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_taxonomy_mapping() {
        let timeout: ReconcileError = ExecError::Timeout {
            stage: "connect",
            timeout: Duration::from_secs(30),
        }
        .into();
        assert!(matches!(timeout, ReconcileError::Connection(_)));

        let failed: ReconcileError = RemoteError::Exec(ExecError::CommandFailed {
            status: 1,
            stderr: "no such file".to_string(),
        })
        .into();
        assert!(matches!(failed, ReconcileError::Command(_)));

        let verify: ReconcileError = RemoteError::Verification("inactive".to_string()).into();
        assert!(verify.is_verification());

        let missing: ReconcileError = InventoryError::HostNotFound("10.0.0.9".to_string()).into();
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_value(ReconcileError::Verification("x".to_string())).unwrap();
        assert_eq!(json["kind"], "verification");
        assert!(json["message"].as_str().unwrap() == "x");
    }
}
