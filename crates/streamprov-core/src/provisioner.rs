//! `Provisioner`: front door routing every call through its key's actor
//!
//! Keeps a registry of `TenantActor`s keyed by (tenant, host). Calls for the
//! same key queue behind each other; different keys run in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use kameo::actor::ActorRef;
use kameo::error::SendError;
use kameo::prelude::*;
use streamprov_exec::Secret;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::actor::tenant::{TenantActor, TenantActorArgs};
use crate::engine::{ConfigEntry, Reconciler};
use crate::error::ReconcileError;
use crate::message::{
    BackupTenant, ChangePassword, CreateTenant, GetTenantStatus, PurgeOrphan, RemoveTenant,
    RestoreTenant, SyncTenant, TenantStatus, UpdateTenant,
};
use crate::result::{CleanupReport, Operation, OperationResult, ServiceReport, Steps};
use crate::tenant::{FieldChanges, TenantConfig, TenantKey, TenantName};

/// Serialized access to the reconciliation engine
pub struct Provisioner {
    engine: Arc<Reconciler>,
    actors: Mutex<HashMap<TenantKey, ActorRef<TenantActor>>>,
}

impl Provisioner {
    #[must_use]
    pub fn new(engine: Arc<Reconciler>) -> Self {
        Self {
            engine,
            actors: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<Reconciler> {
        &self.engine
    }

    /// Number of live per-key actors
    pub async fn actor_count(&self) -> usize {
        self.actors.lock().await.len()
    }

    /// Get or spawn the actor owning `key`
    async fn actor_for(&self, key: TenantKey) -> ActorRef<TenantActor> {
        let mut actors = self.actors.lock().await;
        if let Some(actor) = actors.get(&key)
            && actor.is_alive()
        {
            return actor.clone();
        }

        let actor = TenantActor::spawn(TenantActorArgs {
            key: key.clone(),
            engine: self.engine.clone(),
        });
        info!(%key, "spawned TenantActor");
        actors.insert(key, actor.clone());
        actor
    }

    /// Drop `key`'s actor once its tenant is gone from the host
    ///
    /// Only removes the registry entry if it still points at `actor`.
    async fn evict(&self, key: &TenantKey, actor: &ActorRef<TenantActor>) {
        {
            let mut actors = self.actors.lock().await;
            if actors.get(key).is_some_and(|current| current.id() == actor.id()) {
                actors.remove(key);
            }
        }
        info!(%key, "evicting TenantActor");
        actor.stop_gracefully().await.ok();
    }

    fn undelivered(
        operation: Operation,
        key: &TenantKey,
        error: impl std::fmt::Display,
    ) -> OperationResult {
        warn!(%key, %operation, error = %error, "actor did not answer");
        OperationResult::degraded(
            operation,
            key.tenant.as_str(),
            &key.host,
            ReconcileError::Actor(error.to_string()),
            Steps::new(),
        )
    }

    fn flatten<M, T>(reply: Result<T, SendError<M, ReconcileError>>) -> Result<T, ReconcileError> {
        match reply {
            Ok(value) => Ok(value),
            Err(SendError::HandlerError(e)) => Err(e),
            Err(e) => Err(ReconcileError::Actor(e.to_string())),
        }
    }

    pub async fn create(&self, tenant: TenantConfig, host: &str) -> OperationResult {
        let key = TenantKey::new(tenant.name.clone(), host);
        let actor = self.actor_for(key.clone()).await;
        actor
            .ask(CreateTenant { tenant })
            .await
            .unwrap_or_else(|e| Self::undelivered(Operation::Create, &key, e))
    }

    pub async fn update(
        &self,
        tenant: TenantConfig,
        host: &str,
        changes: FieldChanges,
    ) -> OperationResult {
        let key = TenantKey::new(tenant.name.clone(), host);
        let actor = self.actor_for(key.clone()).await;
        actor
            .ask(UpdateTenant { tenant, changes })
            .await
            .unwrap_or_else(|e| Self::undelivered(Operation::Update, &key, e))
    }

    pub async fn sync(&self, tenant: TenantConfig, host: &str) -> OperationResult {
        let key = TenantKey::new(tenant.name.clone(), host);
        let actor = self.actor_for(key.clone()).await;
        actor
            .ask(SyncTenant { tenant })
            .await
            .unwrap_or_else(|e| Self::undelivered(Operation::Sync, &key, e))
    }

    pub async fn remove(&self, name: TenantName, host: &str) -> OperationResult {
        let key = TenantKey::new(name, host);
        let actor = self.actor_for(key.clone()).await;
        let result = actor
            .ask(RemoveTenant)
            .await
            .unwrap_or_else(|e| Self::undelivered(Operation::Remove, &key, e));
        if result.removed_remotely() {
            self.evict(&key, &actor).await;
        }
        result
    }

    /// # Errors
    /// See [`Reconciler::change_password`]
    pub async fn change_password(
        &self,
        name: TenantName,
        host: &str,
        secret: Secret,
    ) -> Result<OperationResult, ReconcileError> {
        let actor = self.actor_for(TenantKey::new(name, host)).await;
        Self::flatten(actor.ask(ChangePassword { secret }).await)
    }

    /// # Errors
    /// See [`Reconciler::backup`]
    pub async fn backup(&self, name: TenantName, host: &str) -> Result<String, ReconcileError> {
        let actor = self.actor_for(TenantKey::new(name, host)).await;
        Self::flatten(actor.ask(BackupTenant).await)
    }

    /// # Errors
    /// See [`Reconciler::restore`]
    pub async fn restore(
        &self,
        name: TenantName,
        host: &str,
        backup: String,
    ) -> Result<OperationResult, ReconcileError> {
        let actor = self.actor_for(TenantKey::new(name, host)).await;
        Self::flatten(actor.ask(RestoreTenant { backup }).await)
    }

    /// Remove orphans on `host`, each purge queued on the orphan's own actor
    ///
    /// The host is resolved once and the session shared with every purge.
    pub async fn cleanup_orphans(&self, host: &str) -> CleanupReport {
        let session = match self.engine.open_session(host).await {
            Ok(session) => session,
            Err(e) => return self.engine.cleanup_not_run(host, &e),
        };
        let scan = match self.engine.scan_orphans(&session).await {
            Ok(scan) => scan,
            Err(e) => return self.engine.cleanup_not_run(host, &e),
        };

        let mut report = CleanupReport::new(host);
        report.warnings.extend(scan.skipped);
        for name in scan.orphans {
            let key = TenantKey::new(name, host);
            let actor = self.actor_for(key.clone()).await;
            let result = actor
                .ask(PurgeOrphan {
                    session: session.clone(),
                })
                .await
                .unwrap_or_else(|e| Self::undelivered(Operation::PurgeOrphan, &key, e));
            report.record(&key.tenant, &result);
            if result.removed_remotely() {
                self.evict(&key, &actor).await;
            }
        }

        self.engine.finish_cleanup(report, &session).await
    }

    /// # Errors
    /// See [`Reconciler::list_configurations`]
    pub async fn list_configurations(
        &self,
        host: &str,
    ) -> Result<Vec<ConfigEntry>, ReconcileError> {
        self.engine.list_configurations(host).await
    }

    pub async fn service_status(&self, host: &str) -> ServiceReport {
        self.engine.service_status(host).await
    }

    /// Last settled state known for a key, if its actor exists
    pub async fn tenant_status(&self, name: TenantName, host: &str) -> Option<TenantStatus> {
        let key = TenantKey::new(name, host);
        let actor = self.actors.lock().await.get(&key).cloned()?;
        actor.ask(GetTenantStatus).await.ok()
    }

    /// Stop every actor after its queued work
    pub async fn shutdown(&self) {
        let mut actors = self.actors.lock().await;
        for (key, actor) in actors.drain() {
            info!(%key, "stopping TenantActor");
            actor.stop_gracefully().await.ok();
        }
    }
}
