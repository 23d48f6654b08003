//! Per-(tenant, host) lifecycle state

use std::fmt;

use serde::Serialize;

use crate::result::Outcome;

/// Last settled state of one tenant on one host, as seen by its actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantState {
    /// Nothing has run for this key yet
    Unknown,
    Present,
    Absent,
    /// Last operation may not have reached the host
    Simulated,
}

impl TenantState {
    /// State reached after an operation ends with `outcome`
    #[must_use]
    pub fn after(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Created | Outcome::Updated | Outcome::Verified => TenantState::Present,
            Outcome::Removed => TenantState::Absent,
            Outcome::Simulated => TenantState::Simulated,
        }
    }
}

impl fmt::Display for TenantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TenantState::Unknown => "unknown",
            TenantState::Present => "present",
            TenantState::Absent => "absent",
            TenantState::Simulated => "simulated",
        };
        f.write_str(name)
    }
}
