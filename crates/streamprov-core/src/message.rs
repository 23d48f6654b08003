//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kameo_macros::Reply;
use streamprov_exec::Secret;

use crate::engine::HostSession;
use crate::result::Operation;
use crate::state::TenantState;
use crate::tenant::{FieldChanges, TenantConfig, TenantKey};

/// Provision, or update if already present
#[derive(Debug)]
pub struct CreateTenant {
    pub tenant: TenantConfig,
}

/// Apply changed fields
#[derive(Debug)]
pub struct UpdateTenant {
    pub tenant: TenantConfig,
    pub changes: FieldChanges,
}

/// Verify presence, provisioning if missing
#[derive(Debug)]
pub struct SyncTenant {
    pub tenant: TenantConfig,
}

/// Remove account and directories
#[derive(Debug)]
pub struct RemoveTenant;

/// Delete an orphan's directories, no restart
///
/// Carries the cleanup's session so the host is not resolved again.
#[derive(Debug)]
pub struct PurgeOrphan {
    pub session: Arc<HostSession>,
}

/// Replace the publish credential
#[derive(Debug)]
pub struct ChangePassword {
    pub secret: Secret,
}

/// Copy the config directory aside
#[derive(Debug)]
pub struct BackupTenant;

/// Put a backup back in place
#[derive(Debug)]
pub struct RestoreTenant {
    /// Path returned by an earlier backup
    pub backup: String,
}

/// Get the actor's view of its key
#[derive(Debug)]
pub struct GetTenantStatus;

/// Tenant status response
#[derive(Debug, Clone, Reply)]
pub struct TenantStatus {
    pub key: TenantKey,
    pub state: TenantState,
    pub last_operation: Option<Operation>,
    pub last_finished: Option<DateTime<Utc>>,
}
