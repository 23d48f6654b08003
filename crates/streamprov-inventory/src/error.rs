//! Error types for streamprov-inventory

use thiserror::Error;

/// Errors that can occur during inventory lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// No active host with this address
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// No tenant with this name
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    /// Host record carries no usable credential
    #[error("no credential configured for host {0}")]
    MissingCredential(String),

    /// The backing store could not be read
    #[error("inventory store error: {0}")]
    Store(String),
}

impl InventoryError {
    /// Check if the lookup simply found nothing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            InventoryError::HostNotFound(_) | InventoryError::TenantNotFound(_)
        )
    }
}
