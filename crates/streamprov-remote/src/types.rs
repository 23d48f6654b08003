//! Type definitions for remote host state

use serde::{Deserialize, Serialize};

/// State word `systemctl is-active` prints for a running unit
pub const ACTIVE: &str = "active";

/// Snapshot of the managed service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Unit state (`active`, `inactive`, `failed`, ... or `unknown`)
    pub state: String,
    /// First line of the server's version banner, if it printed one
    pub version: Option<String>,
    pub running: bool,
}

impl ServiceStatus {
    /// Status built from a unit state word
    pub fn from_state(state: impl Into<String>) -> Self {
        let state = state.into();
        Self {
            running: state == ACTIVE,
            state,
            version: None,
        }
    }

    /// Status when the host could not be asked
    #[must_use]
    pub fn unknown() -> Self {
        Self::from_state("unknown")
    }

    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_state() {
        assert!(ServiceStatus::from_state("active").running);
        assert!(!ServiceStatus::from_state("activating").running);
        assert!(!ServiceStatus::unknown().running);
    }
}
