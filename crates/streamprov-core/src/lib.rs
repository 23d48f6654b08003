//! streamprov-core: Tenant reconciliation engine and actors
//!
//! `Reconciler` drives remote hosts toward the desired tenant configuration.
//! `Provisioner` routes calls through one `TenantActor` per (tenant, host),
//! so operations on the same pair never overlap.

pub mod actor;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod message;
pub mod provisioner;
pub mod result;
pub mod state;
pub mod tenant;

pub use actor::{TenantActor, TenantActorArgs};
pub use config::EngineConfig;
pub use engine::{ConfigEntry, HostSession, OrphanScan, Reconciler, backup_owner};
pub use error::ReconcileError;
pub use factory::ExecutorFactory;
pub use message::{
    BackupTenant, ChangePassword, CreateTenant, GetTenantStatus, PurgeOrphan, RemoveTenant,
    RestoreTenant, SyncTenant, TenantStatus, UpdateTenant,
};
pub use provisioner::Provisioner;
pub use result::{
    CleanupReport, Operation, OperationResult, Outcome, ServiceReport, Severity, StepResult, Steps,
};
pub use state::TenantState;
pub use tenant::{FieldChanges, TenantConfig, TenantKey, TenantName};
