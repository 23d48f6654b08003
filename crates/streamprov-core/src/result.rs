//! Operation results and per-step bookkeeping

use std::fmt;

use chrono::{DateTime, Utc};
use kameo_macros::Reply;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::ReconcileError;

/// How a failed step affects its operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure escalates the whole operation
    Fatal,
    /// Failure is recorded and the operation continues
    Advisory,
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub name: &'static str,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReconcileError>,
}

impl StepResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Steps taken so far by one operation
#[derive(Debug, Clone, Default)]
pub struct Steps {
    steps: Vec<StepResult>,
}

impl Steps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, name: &'static str, severity: Severity, error: Option<ReconcileError>) {
        self.steps.push(StepResult {
            name,
            severity,
            error,
        });
    }

    /// Record a step whose failure aborts the operation
    ///
    /// # Errors
    /// Passes the step's error through after recording it
    pub fn fatal<T, E>(&mut self, name: &'static str, result: Result<T, E>) -> Result<T, ReconcileError>
    where
        E: Into<ReconcileError>,
    {
        match result {
            Ok(value) => {
                self.record(name, Severity::Fatal, None);
                Ok(value)
            }
            Err(e) => {
                let e = e.into();
                error!(step = name, error = %e, "step failed");
                self.record(name, Severity::Fatal, Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Record a step whose failure is only reported
    pub fn advisory<T, E>(&mut self, name: &'static str, result: Result<T, E>) -> Option<T>
    where
        E: Into<ReconcileError>,
    {
        match result {
            Ok(value) => {
                self.record(name, Severity::Advisory, None);
                Some(value)
            }
            Err(e) => {
                let e = e.into();
                warn!(step = name, error = %e, "advisory step failed");
                self.record(name, Severity::Advisory, Some(e));
                None
            }
        }
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.steps.iter().all(StepResult::succeeded)
    }

    /// Error worth surfacing: a failed verification first, else the first failure
    #[must_use]
    pub fn primary_error(&self) -> Option<ReconcileError> {
        let failures: Vec<&ReconcileError> =
            self.steps.iter().filter_map(|s| s.error.as_ref()).collect();
        failures
            .iter()
            .find(|e| e.is_verification())
            .or_else(|| failures.first())
            .map(|e| (*e).clone())
    }

    fn warnings(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| format!("step {} failed: {e}", s.name)))
            .collect()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[StepResult] {
        &self.steps
    }
}

/// Which operation produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Sync,
    Remove,
    PurgeOrphan,
    ChangePassword,
    Restore,
}

impl Operation {
    /// Whether the operation deletes remote state
    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            Operation::Remove | Operation::PurgeOrphan | Operation::Restore
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Sync => "sync",
            Operation::Remove => "remove",
            Operation::PurgeOrphan => "purge",
            Operation::ChangePassword => "change password",
            Operation::Restore => "restore",
        };
        f.write_str(name)
    }
}

/// Terminal state reached by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
    Verified,
    Removed,
    /// Considered done without (full) remote effect
    Simulated,
}

/// Result of one reconciliation call; never stored
#[derive(Debug, Clone, Serialize, Reply)]
pub struct OperationResult {
    pub operation: Operation,
    pub tenant: String,
    pub host: String,
    pub outcome: Outcome,
    pub success: bool,
    /// True when the remote effect may not have happened
    pub simulated: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ReconcileError>,
    pub steps: Vec<StepResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

impl OperationResult {
    /// Operation ran to its end; advisory failures become warnings
    pub fn completed(
        operation: Operation,
        tenant: impl Into<String>,
        host: impl Into<String>,
        outcome: Outcome,
        message: impl Into<String>,
        steps: Steps,
    ) -> Self {
        let success = if operation.is_destructive() {
            steps.all_succeeded()
        } else {
            true
        };

        Self {
            operation,
            tenant: tenant.into(),
            host: host.into(),
            outcome,
            success,
            simulated: false,
            message: message.into(),
            detail: steps.primary_error(),
            warnings: steps.warnings(),
            steps: steps.steps,
            finished_at: Utc::now(),
        }
    }

    /// Operation escalated or never reached the host
    pub fn degraded(
        operation: Operation,
        tenant: impl Into<String>,
        host: impl Into<String>,
        error: ReconcileError,
        steps: Steps,
    ) -> Self {
        let host = host.into();
        let mut warnings = steps.warnings();
        if operation.is_destructive() {
            warnings.push(format!(
                "{operation} was not carried out on {host}; remote state may remain"
            ));
        }

        Self {
            operation,
            tenant: tenant.into(),
            host,
            outcome: Outcome::Simulated,
            success: true,
            simulated: true,
            message: format!("{operation} simulated: {error}"),
            detail: Some(error),
            warnings,
            steps: steps.steps,
            finished_at: Utc::now(),
        }
    }

    /// Mark a result produced against a simulated executor
    #[must_use]
    pub fn into_simulated(mut self) -> Self {
        if !self.simulated {
            self.simulated = true;
            self.outcome = Outcome::Simulated;
            self.message = format!("{} (simulated execution)", self.message);
        }
        self
    }

    /// Whether remote state was actually deleted: every step succeeded
    /// against a live host
    #[must_use]
    pub fn removed_remotely(&self) -> bool {
        self.success && self.outcome == Outcome::Removed && !self.simulated
    }

    /// Step by name
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Orphan cleanup summary for one host
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub host: String,
    pub removed_count: usize,
    pub removed_names: Vec<String>,
    pub simulated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CleanupReport {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Fold in the purge of one orphan; only real deletions are counted
    pub fn record(&mut self, name: impl fmt::Display, purge: &OperationResult) {
        self.simulated |= purge.simulated;
        if purge.removed_remotely() {
            self.removed_count += 1;
            self.removed_names.push(name.to_string());
        }
        self.warnings
            .extend(purge.warnings.iter().map(|w| format!("{name}: {w}")));
    }

    /// Fold in the final restart
    pub fn record_restart(&mut self, restarted: Result<(), ReconcileError>) {
        if let Err(e) = restarted {
            warn!(error = %e, "restart after cleanup failed");
            self.warnings.push(format!("restart after cleanup failed: {e}"));
        }
    }
}

/// Media server status as seen from one host
#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub host: String,
    pub status: String,
    pub version: Option<String>,
    pub running: bool,
    pub simulated: bool,
}
