//! Reconciliation Engine
//!
//! Drives one tenant on one host toward its desired state. Every public
//! operation resolves the host before the first remote command; provisioning
//! operations turn escalated failures into simulated results instead of
//! erroring, and destructive ones report step failures as warnings.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use streamprov_exec::{ExecutionMode, RemoteExecutor, Secret};
use streamprov_inventory::{HostResolver, InventoryError, InventoryStore};
use streamprov_remote::{
    Presence, RemoteFileWriter, ServiceController, ServiceStatus, SystemdController, commands,
};
use streamprov_template::artifacts::{
    CREDENTIAL_FILE, DESCRIPTOR_FILE, FTP_USER_CONFIG_FILE, render_credential,
    render_ftp_user_config,
};
use streamprov_template::{
    ApplicationParams, BANDWIDTH_PROPERTIES, PropertyValue, TransferStrategy, VIEWER_PROPERTIES,
    render_artifacts, set_properties,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{CONFIG_DIR_MODE, EngineConfig, STORAGE_DIR_MODE};
use crate::error::ReconcileError;
use crate::factory::ExecutorFactory;
use crate::result::{CleanupReport, Operation, OperationResult, Outcome, ServiceReport, Steps};
use crate::tenant::{
    FieldChanges, TenantConfig, TenantName, check_account_password, check_secret,
};

/// Remote handles for one resolved host
///
/// Opened per operation; a cleanup opens one and hands it to every purge.
pub struct HostSession {
    address: String,
    executor: Arc<dyn RemoteExecutor>,
    writer: RemoteFileWriter,
    service: SystemdController,
}

impl fmt::Debug for HostSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSession")
            .field("address", &self.address)
            .field("executor", &self.executor.executor_type())
            .finish_non_exhaustive()
    }
}

impl HostSession {
    /// Address the host resolved to
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn run(&self, cmd: &str) -> Result<String, ReconcileError> {
        Ok(self.executor.exec(cmd).await?)
    }

    async fn presence(&self, probe: &'static str, cmd: &str) -> Result<Presence, ReconcileError> {
        let output = self.run(cmd).await?;
        Ok(Presence::parse(probe, &output)?)
    }
}

/// Config directory entries not backed by a tenant record
#[derive(Debug, Clone, Default)]
pub struct OrphanScan {
    pub orphans: Vec<TenantName>,
    /// Entries left alone because they cannot be tenant names
    pub skipped: Vec<String>,
}

/// One entry under the config root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub name: String,
    /// Tenant this entry is a backup of, for `<tenant>_backup_<millis>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_of: Option<String>,
}

impl ConfigEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            backup_of: backup_owner(name).map(str::to_string),
        }
    }
}

/// Owner of a backup entry named `<tenant>_backup_<digits>`
#[must_use]
pub fn backup_owner(entry: &str) -> Option<&str> {
    let (owner, stamp) = entry.rsplit_once("_backup_")?;
    let stamped = !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit());
    (stamped && TenantName::parse(owner).is_ok()).then_some(owner)
}

type Step = Result<(Outcome, String), ReconcileError>;

/// Tenant lifecycle against media hosts
pub struct Reconciler {
    resolver: HostResolver,
    store: Arc<dyn InventoryStore>,
    factory: Arc<dyn ExecutorFactory>,
    config: EngineConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        factory: Arc<dyn ExecutorFactory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resolver: HostResolver::new(store.clone()),
            store,
            factory,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.factory.mode()
    }

    /// Load a tenant from the inventory store
    ///
    /// # Errors
    /// `NotFound` for unknown tenants, `InvalidTenant` for unusable records
    pub async fn tenant_config(&self, name: &str) -> Result<TenantConfig, ReconcileError> {
        let record = self
            .store
            .tenant(name)
            .await?
            .ok_or_else(|| InventoryError::TenantNotFound(name.to_string()))?;
        TenantConfig::from_record(record, &self.config)
    }

    /// Resolve `address` once for a multi-step operation such as cleanup
    ///
    /// # Errors
    /// Host resolution failure
    pub async fn open_session(&self, address: &str) -> Result<Arc<HostSession>, ReconcileError> {
        Ok(Arc::new(self.open(address).await?))
    }

    async fn open(&self, address: &str) -> Result<HostSession, ReconcileError> {
        let target = self.resolver.resolve(address).await?;
        let executor = self.factory.create_executor(&target).await;
        debug!(executor = executor.executor_type(), "host session opened");

        let service = SystemdController::new(
            executor.clone(),
            &self.config.service_unit,
            self.config.restart_grace(),
        )
        .with_version_command(&self.config.version_command);

        Ok(HostSession {
            address: target.address,
            writer: RemoteFileWriter::new(executor.clone()),
            service,
            executor,
        })
    }

    fn conclude(
        &self,
        operation: Operation,
        tenant: &TenantName,
        host: &str,
        steps: Steps,
        step: Step,
    ) -> OperationResult {
        let result = match step {
            Ok((outcome, message)) => {
                info!(%operation, ?outcome, "operation finished");
                OperationResult::completed(operation, tenant.as_str(), host, outcome, message, steps)
            }
            Err(e) => {
                warn!(%operation, error = %e, "operation degraded to simulated");
                OperationResult::degraded(operation, tenant.as_str(), host, e, steps)
            }
        };

        match self.mode() {
            ExecutionMode::Simulated => result.into_simulated(),
            ExecutionMode::Live => result,
        }
    }

    // ------------------------------------------------------------------
    // Provisioning
    // ------------------------------------------------------------------

    /// Provision a tenant, or update it if its config directory exists
    #[instrument(skip(self, tenant), fields(tenant = %tenant.name))]
    pub async fn create(&self, tenant: &TenantConfig, host: &str) -> OperationResult {
        let mut steps = Steps::new();
        let step = match self.open(host).await {
            Ok(session) => self.create_on(&session, tenant, &mut steps).await,
            Err(e) => Err(e),
        };
        self.conclude(Operation::Create, &tenant.name, host, steps, step)
    }

    /// Apply changed fields to an existing descriptor, or provision if absent
    #[instrument(skip(self, tenant), fields(tenant = %tenant.name))]
    pub async fn update(
        &self,
        tenant: &TenantConfig,
        host: &str,
        changes: &FieldChanges,
    ) -> OperationResult {
        let mut steps = Steps::new();
        let step = match self.open(host).await {
            Ok(session) => self.update_on(&session, tenant, changes, &mut steps).await,
            Err(e) => Err(e),
        };
        self.conclude(Operation::Update, &tenant.name, host, steps, step)
    }

    /// Verify presence; provision only when the config directory is missing
    #[instrument(skip(self, tenant), fields(tenant = %tenant.name))]
    pub async fn sync(&self, tenant: &TenantConfig, host: &str) -> OperationResult {
        let mut steps = Steps::new();
        let step = match self.open(host).await {
            Ok(session) => self.sync_on(&session, tenant, &mut steps).await,
            Err(e) => Err(e),
        };
        self.conclude(Operation::Sync, &tenant.name, host, steps, step)
    }

    async fn probe_config_dir(
        &self,
        session: &HostSession,
        name: &TenantName,
        steps: &mut Steps,
    ) -> Result<Presence, ReconcileError> {
        let dir = self.config.tenant_dir(name.as_str());
        steps.fatal(
            "probe_config_dir",
            session
                .presence("config directory", &commands::dir_exists(&dir))
                .await,
        )
    }

    async fn create_on(
        &self,
        session: &HostSession,
        tenant: &TenantConfig,
        steps: &mut Steps,
    ) -> Step {
        if self.probe_config_dir(session, &tenant.name, steps).await?.exists() {
            info!("config directory present, updating instead");
            return self
                .update_on(session, tenant, &FieldChanges::all_of(tenant), steps)
                .await;
        }

        self.provision(session, tenant, steps).await?;
        Ok((
            Outcome::Created,
            format!("{} provisioned on {}", tenant.name, session.address),
        ))
    }

    async fn sync_on(&self, session: &HostSession, tenant: &TenantConfig, steps: &mut Steps) -> Step {
        if self.probe_config_dir(session, &tenant.name, steps).await?.exists() {
            return Ok((
                Outcome::Verified,
                format!("{} present on {}", tenant.name, session.address),
            ));
        }

        info!("config directory missing, provisioning");
        self.provision(session, tenant, steps).await?;
        Ok((
            Outcome::Created,
            format!("{} provisioned on {}", tenant.name, session.address),
        ))
    }

    async fn update_on(
        &self,
        session: &HostSession,
        tenant: &TenantConfig,
        changes: &FieldChanges,
        steps: &mut Steps,
    ) -> Step {
        let descriptor = format!(
            "{}/{DESCRIPTOR_FILE}",
            self.config.tenant_dir(tenant.name.as_str())
        );

        let presence = steps.fatal(
            "probe_descriptor",
            session
                .presence("descriptor", &commands::file_exists(&descriptor))
                .await,
        )?;
        if !presence.exists() {
            info!("descriptor missing, provisioning instead");
            let tenant = tenant.with_changes(changes);
            self.provision(session, &tenant, steps).await?;
            return Ok((
                Outcome::Created,
                format!("{} provisioned on {}", tenant.name, session.address),
            ));
        }

        let current = steps.fatal(
            "read_descriptor",
            session.run(&commands::read_file(&descriptor)).await,
        )?;
        let (edited, diff) = steps.fatal(
            "edit_descriptor",
            set_properties(&current, &property_updates(changes)),
        )?;

        if diff.is_empty() {
            return Ok((
                Outcome::Updated,
                format!("{} already up to date on {}", tenant.name, session.address),
            ));
        }

        steps.fatal(
            "write_descriptor",
            session
                .writer
                .write(&descriptor, edited.as_bytes(), TransferStrategy::Primary)
                .await,
        )?;
        steps.advisory("restart", session.service.restart().await);

        let changed: Vec<String> = diff
            .iter()
            .map(|c| format!("{} {} -> {}", c.name, c.old, c.new))
            .collect();
        info!(fields = diff.len(), "descriptor updated");
        Ok((
            Outcome::Updated,
            format!(
                "{} updated on {}: {}",
                tenant.name,
                session.address,
                changed.join(", ")
            ),
        ))
    }

    /// Full provisioning of an absent tenant
    ///
    /// Directory and artifact failures escalate; everything after the
    /// artifacts is advisory.
    async fn provision(
        &self,
        session: &HostSession,
        tenant: &TenantConfig,
        steps: &mut Steps,
    ) -> Result<(), ReconcileError> {
        let name = tenant.name.as_str();
        let dir = self.config.tenant_dir(name);
        let storage = self.config.storage_dir(name);

        steps.fatal("create_config_dir", session.run(&commands::make_dir(&dir)).await)?;
        steps.fatal(
            "open_config_dir",
            session.run(&commands::chmod(CONFIG_DIR_MODE, &dir)).await,
        )?;

        let params = ApplicationParams {
            name: name.to_string(),
            host_address: session.address.clone(),
            bandwidth_kbps: tenant.bandwidth_kbps,
            max_viewers: tenant.viewer_cap.effective(),
            publish_secret: tenant.stream_secret.expose().to_string(),
            storage_dir: storage.clone(),
        };
        for artifact in render_artifacts(&params) {
            let used = steps.fatal(
                "write_artifact",
                session.writer.write_artifact(&dir, &artifact).await,
            )?;
            debug!(file = %artifact.relative_path, strategy = ?used, "artifact placed");
        }

        steps.advisory("storage_dir", session.run(&commands::make_dir(&storage)).await);

        let account = self.ensure_account(session, tenant, &storage).await;
        if steps.advisory("os_account", account).is_some() {
            let ftp_conf = format!("{storage}/{FTP_USER_CONFIG_FILE}");
            let written = session
                .writer
                .write(
                    &ftp_conf,
                    render_ftp_user_config(&storage).as_bytes(),
                    TransferStrategy::Fallback,
                )
                .await;
            steps.advisory("ftp_user_config", written);
        }

        let permissions = self.apply_permissions(session, name, &dir, &storage).await;
        steps.advisory("permissions", permissions);
        steps.advisory("restart", session.service.restart().await);

        Ok(())
    }

    async fn ensure_account(
        &self,
        session: &HostSession,
        tenant: &TenantConfig,
        home: &str,
    ) -> Result<(), ReconcileError> {
        let login = tenant.name.as_str();
        check_account_password(&tenant.name, tenant.account_secret())?;
        match session
            .presence("account", &commands::user_exists(login))
            .await?
        {
            Presence::Exists => debug!("account already present"),
            Presence::Missing => {
                session
                    .run(&commands::create_account(login, home))
                    .await?;
                info!("account created");
            }
        }
        session
            .run(&commands::set_password(
                login,
                tenant.account_secret().expose(),
            ))
            .await?;
        Ok(())
    }

    async fn apply_permissions(
        &self,
        session: &HostSession,
        name: &str,
        dir: &str,
        storage: &str,
    ) -> Result<(), ReconcileError> {
        session
            .run(&commands::chown_recursive(&self.config.service_owner(), dir))
            .await?;
        session
            .run(&commands::chmod_recursive(CONFIG_DIR_MODE, dir))
            .await?;
        session
            .run(&commands::chown_recursive(&format!("{name}:{name}"), storage))
            .await?;
        session
            .run(&commands::chmod_recursive(STORAGE_DIR_MODE, storage))
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove a tenant's account and both directories, best effort
    #[instrument(skip(self), fields(tenant = %name))]
    pub async fn remove(&self, name: &TenantName, host: &str) -> OperationResult {
        let session = match self.open(host).await {
            Ok(session) => session,
            Err(e) => return self.conclude(Operation::Remove, name, host, Steps::new(), Err(e)),
        };

        let mut steps = Steps::new();
        steps.advisory("stop", session.service.stop().await);
        steps.advisory(
            "delete_account",
            session.run(&commands::delete_account(name.as_str())).await,
        );
        self.remove_dirs(&session, name, &mut steps).await;
        steps.advisory("restart", session.service.restart().await);

        let message = format!("{name} removed from {}", session.address);
        self.conclude(Operation::Remove, name, host, steps, Ok((Outcome::Removed, message)))
    }

    async fn remove_dirs(&self, session: &HostSession, name: &TenantName, steps: &mut Steps) {
        let dir = self.config.tenant_dir(name.as_str());
        let storage = self.config.storage_dir(name.as_str());
        steps.advisory(
            "remove_config_dir",
            session.run(&commands::remove_dir(&dir)).await,
        );
        steps.advisory(
            "remove_storage_dir",
            session.run(&commands::remove_dir(&storage)).await,
        );
    }

    /// Delete one orphan's directories over an open session, no restart
    #[instrument(skip(self, session), fields(tenant = %name, host = %session.address))]
    pub async fn purge_orphan(&self, name: &TenantName, session: &HostSession) -> OperationResult {
        let mut steps = Steps::new();
        self.remove_dirs(session, name, &mut steps).await;

        let message = format!("orphan {name} purged from {}", session.address);
        self.conclude(
            Operation::PurgeOrphan,
            name,
            &session.address,
            steps,
            Ok((Outcome::Removed, message)),
        )
    }

    /// Config-root entries, system files excluded, backups marked
    ///
    /// # Errors
    /// Host resolution or listing failure
    #[instrument(skip(self))]
    pub async fn list_configurations(&self, host: &str) -> Result<Vec<ConfigEntry>, ReconcileError> {
        let session = self.open(host).await?;
        self.list_on(&session).await
    }

    async fn list_on(&self, session: &HostSession) -> Result<Vec<ConfigEntry>, ReconcileError> {
        let output = session
            .run(&commands::list_entries(
                &self.config.config_root,
                &self.config.system_entries,
            ))
            .await?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ConfigEntry::new)
            .collect())
    }

    /// Entries present on the host that no tenant record claims
    ///
    /// Backups of inventoried tenants are kept; entries that cannot be
    /// tenant names are never returned as orphans.
    ///
    /// # Errors
    /// Listing or inventory failure
    pub async fn scan_orphans(&self, session: &HostSession) -> Result<OrphanScan, ReconcileError> {
        let present = self.list_on(session).await?;
        let valid: HashSet<String> = self.store.tenant_names().await?.into_iter().collect();

        let mut scan = OrphanScan::default();
        for entry in present.into_iter().filter(|e| !valid.contains(&e.name)) {
            if entry.backup_of.as_ref().is_some_and(|owner| valid.contains(owner)) {
                debug!(entry = %entry.name, "keeping backup of a known tenant");
                continue;
            }
            match TenantName::parse(&entry.name) {
                Ok(name) => scan.orphans.push(name),
                Err(_) => {
                    warn!(entry = %entry.name, "leaving unrecognised config entry alone");
                    scan.skipped
                        .push(format!("skipped entry {:?}: not a tenant name", entry.name));
                }
            }
        }
        Ok(scan)
    }

    /// Remove every orphan on `host`, restarting once at the end
    ///
    /// The host is resolved once; every purge and the restart reuse it.
    #[instrument(skip(self))]
    pub async fn cleanup_orphans(&self, host: &str) -> CleanupReport {
        let session = match self.open(host).await {
            Ok(session) => session,
            Err(e) => return self.cleanup_not_run(host, &e),
        };
        let scan = match self.scan_orphans(&session).await {
            Ok(scan) => scan,
            Err(e) => return self.cleanup_not_run(host, &e),
        };

        let mut report = CleanupReport::new(host);
        report.warnings.extend(scan.skipped);
        for name in &scan.orphans {
            let result = self.purge_orphan(name, &session).await;
            report.record(name, &result);
        }
        self.finish_cleanup(report, &session).await
    }

    /// Restart once if anything was removed and stamp the execution mode
    pub async fn finish_cleanup(
        &self,
        mut report: CleanupReport,
        session: &HostSession,
    ) -> CleanupReport {
        if report.removed_count > 0 {
            let restarted = session.service.restart().await;
            report.record_restart(restarted.map_err(ReconcileError::from));
        }
        report.simulated |= self.mode() == ExecutionMode::Simulated;
        info!(removed = report.removed_count, "orphan cleanup finished");
        report
    }

    /// Report for a cleanup that never reached the host
    #[must_use]
    pub fn cleanup_not_run(&self, host: &str, error: &ReconcileError) -> CleanupReport {
        warn!(error = %error, "orphan cleanup not carried out");
        let mut report = CleanupReport::new(host);
        report.simulated = true;
        report
            .warnings
            .push(format!("cleanup was not carried out on {host}: {error}"));
        report
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Replace a tenant's publish credential
    ///
    /// Unlike provisioning, failures are returned rather than simulated.
    ///
    /// # Errors
    /// `InvalidTenant` for a bad secret, `NotFound` if the credential file
    /// does not exist yet, or the failing step's error
    #[instrument(skip(self, secret), fields(tenant = %name))]
    pub async fn change_password(
        &self,
        name: &TenantName,
        host: &str,
        secret: &Secret,
    ) -> Result<OperationResult, ReconcileError> {
        check_secret(name, secret)?;
        let session = self.open(host).await?;
        let path = format!("{}/{CREDENTIAL_FILE}", self.config.tenant_dir(name.as_str()));

        let mut steps = Steps::new();
        let presence = steps.fatal(
            "probe_credential",
            session
                .presence("credential", &commands::file_exists(&path))
                .await,
        )?;
        if !presence.exists() {
            return Err(ReconcileError::NotFound(format!(
                "{path} on {}",
                session.address
            )));
        }

        let body = render_credential(name.as_str(), secret.expose());
        steps.fatal(
            "write_credential",
            session
                .writer
                .write(&path, body.as_bytes(), TransferStrategy::Fallback)
                .await,
        )?;
        steps.fatal("restart", session.service.restart().await)?;

        let message = format!("publish credential for {name} replaced on {}", session.address);
        Ok(self.conclude(
            Operation::ChangePassword,
            name,
            host,
            steps,
            Ok((Outcome::Updated, message)),
        ))
    }

    /// Copy a tenant's config directory next to itself; returns the copy's path
    ///
    /// # Errors
    /// `NotFound` if the tenant has no config directory on the host
    #[instrument(skip(self), fields(tenant = %name))]
    pub async fn backup(&self, name: &TenantName, host: &str) -> Result<String, ReconcileError> {
        let session = self.open(host).await?;
        let dir = self.config.tenant_dir(name.as_str());

        if !session
            .presence("config directory", &commands::dir_exists(&dir))
            .await?
            .exists()
        {
            return Err(ReconcileError::NotFound(format!(
                "{dir} on {}",
                session.address
            )));
        }

        let backup = format!("{dir}_backup_{}", Utc::now().timestamp_millis());
        session.run(&commands::copy_dir(&dir, &backup)).await?;
        info!(%backup, "config directory backed up");
        Ok(backup)
    }

    /// Put a backup made by [`Reconciler::backup`] back in place
    ///
    /// # Errors
    /// `InvalidTenant` if `backup` is not one of this tenant's backups,
    /// `NotFound` if it does not exist, or the failing step's error
    #[instrument(skip(self), fields(tenant = %name))]
    pub async fn restore(
        &self,
        name: &TenantName,
        host: &str,
        backup: &str,
    ) -> Result<OperationResult, ReconcileError> {
        let dir = self.config.tenant_dir(name.as_str());
        let root = format!("{}/", self.config.config_root.trim_end_matches('/'));
        let is_own_backup = backup
            .strip_prefix(&root)
            .and_then(backup_owner)
            .is_some_and(|owner| owner == name.as_str());
        if !is_own_backup {
            return Err(ReconcileError::InvalidTenant(format!(
                "{backup} is not a backup of {name}"
            )));
        }

        let session = self.open(host).await?;
        if !session
            .presence("backup", &commands::dir_exists(backup))
            .await?
            .exists()
        {
            return Err(ReconcileError::NotFound(format!(
                "{backup} on {}",
                session.address
            )));
        }

        let mut steps = Steps::new();
        steps.fatal("stop", session.service.stop().await)?;
        steps.fatal("remove_config_dir", session.run(&commands::remove_dir(&dir)).await)?;
        steps.fatal(
            "copy_backup",
            session.run(&commands::copy_dir(backup, &dir)).await,
        )?;
        steps.advisory("restart", session.service.restart().await);

        let message = format!("{name} restored from {backup} on {}", session.address);
        Ok(self.conclude(
            Operation::Restore,
            name,
            host,
            steps,
            Ok((Outcome::Updated, message)),
        ))
    }

    /// Media server state; an unresolvable host reports a simulated `active`
    #[instrument(skip(self))]
    pub async fn service_status(&self, host: &str) -> ServiceReport {
        let simulated_mode = self.mode() == ExecutionMode::Simulated;
        let session = match self.open(host).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "host unavailable, reporting simulated status");
                return ServiceReport {
                    host: host.to_string(),
                    status: "active".to_string(),
                    version: None,
                    running: true,
                    simulated: true,
                };
            }
        };

        let status = match session.service.status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "service status unavailable");
                ServiceStatus::unknown()
            }
        };

        ServiceReport {
            host: session.address,
            status: status.state,
            version: status.version,
            running: status.running,
            simulated: simulated_mode,
        }
    }
}

/// Descriptor edits for exactly the changed fields
fn property_updates(changes: &FieldChanges) -> Vec<(&'static str, PropertyValue)> {
    let mut updates = Vec::new();
    if let Some(bandwidth) = changes.bandwidth_kbps {
        updates.extend(
            BANDWIDTH_PROPERTIES
                .iter()
                .map(|name| (*name, PropertyValue::Integer(i64::from(bandwidth)))),
        );
    }
    if let Some(cap) = changes.viewer_cap {
        updates.extend(
            VIEWER_PROPERTIES
                .iter()
                .map(|name| (*name, PropertyValue::Integer(i64::from(cap.effective())))),
        );
    }
    updates
}

#[cfg(test)]
mod tests {
    use streamprov_inventory::ViewerCap;

    use super::*;

    #[test]
    fn test_property_updates_cover_duplicates() {
        let updates = property_updates(&FieldChanges {
            bandwidth_kbps: Some(2500),
            viewer_cap: None,
        });
        let names: Vec<&str> = updates.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, BANDWIDTH_PROPERTIES);

        let updates = property_updates(&FieldChanges {
            bandwidth_kbps: None,
            viewer_cap: Some(ViewerCap::Unlimited),
        });
        assert!(
            updates
                .iter()
                .all(|(_, v)| *v == PropertyValue::Integer(999_999))
        );
        assert!(property_updates(&FieldChanges::default()).is_empty());
    }

    #[test]
    fn test_backup_owner() {
        assert_eq!(backup_owner("acct1_backup_1700000000000"), Some("acct1"));
        assert_eq!(backup_owner("my_backup_x_backup_12"), Some("my_backup_x"));
        assert_eq!(backup_owner("acct1_backup_"), None);
        assert_eq!(backup_owner("acct1_backup_12a"), None);
        assert_eq!(backup_owner("Notes_backup_1"), None);
        assert_eq!(backup_owner("acct1"), None);

        let entry = ConfigEntry::new("acct1_backup_5");
        assert_eq!(entry.backup_of.as_deref(), Some("acct1"));
        assert_eq!(ConfigEntry::new("acct1").backup_of, None);
    }
}
