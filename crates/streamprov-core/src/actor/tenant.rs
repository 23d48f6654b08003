//! `TenantActor`: single writer for one (tenant, host) pair
//!
//! Messages are handled one at a time, so two operations on the same tenant
//! and host never interleave their remote commands.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tracing::info;

use crate::engine::Reconciler;
use crate::error::ReconcileError;
use crate::message::{
    BackupTenant, ChangePassword, CreateTenant, GetTenantStatus, PurgeOrphan, RemoveTenant,
    RestoreTenant, SyncTenant, TenantStatus, UpdateTenant,
};
use crate::result::{Operation, OperationResult};
use crate::state::TenantState;
use crate::tenant::TenantKey;

/// Arguments for spawning a `TenantActor`
pub struct TenantActorArgs {
    pub key: TenantKey,
    pub engine: Arc<Reconciler>,
}

/// Per-key actor serializing reconciliation calls
pub struct TenantActor {
    key: TenantKey,
    engine: Arc<Reconciler>,
    state: TenantState,
    last_operation: Option<Operation>,
    last_finished: Option<DateTime<Utc>>,
}

impl TenantActor {
    /// Record where an operation left the tenant
    fn settle(&mut self, result: &OperationResult) {
        let next = TenantState::after(result.outcome);
        if next != self.state {
            info!(key = %self.key, from = %self.state, to = %next, "state transition");
        }
        self.state = next;
        self.last_operation = Some(result.operation);
        self.last_finished = Some(result.finished_at);
    }
}

impl Actor for TenantActor {
    type Args = TenantActorArgs;
    type Error = ReconcileError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(key = %args.key, id = %actor_ref.id(), "TenantActor starting");

        Ok(Self {
            key: args.key,
            engine: args.engine,
            state: TenantState::Unknown,
            last_operation: None,
            last_finished: None,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(key = %self.key, reason = ?reason, "TenantActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<CreateTenant> for TenantActor {
    type Reply = OperationResult;

    async fn handle(
        &mut self,
        msg: CreateTenant,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let result = self.engine.create(&msg.tenant, &self.key.host).await;
        self.settle(&result);
        result
    }
}

impl Message<UpdateTenant> for TenantActor {
    type Reply = OperationResult;

    async fn handle(
        &mut self,
        msg: UpdateTenant,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let result = self
            .engine
            .update(&msg.tenant, &self.key.host, &msg.changes)
            .await;
        self.settle(&result);
        result
    }
}

impl Message<SyncTenant> for TenantActor {
    type Reply = OperationResult;

    async fn handle(
        &mut self,
        msg: SyncTenant,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let result = self.engine.sync(&msg.tenant, &self.key.host).await;
        self.settle(&result);
        result
    }
}

impl Message<RemoveTenant> for TenantActor {
    type Reply = OperationResult;

    async fn handle(
        &mut self,
        _msg: RemoveTenant,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let result = self.engine.remove(&self.key.tenant, &self.key.host).await;
        self.settle(&result);
        result
    }
}

impl Message<PurgeOrphan> for TenantActor {
    type Reply = OperationResult;

    async fn handle(
        &mut self,
        msg: PurgeOrphan,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let result = self
            .engine
            .purge_orphan(&self.key.tenant, &msg.session)
            .await;
        self.settle(&result);
        result
    }
}

impl Message<ChangePassword> for TenantActor {
    type Reply = Result<OperationResult, ReconcileError>;

    async fn handle(
        &mut self,
        msg: ChangePassword,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let result = self
            .engine
            .change_password(&self.key.tenant, &self.key.host, &msg.secret)
            .await?;
        self.settle(&result);
        Ok(result)
    }
}

impl Message<BackupTenant> for TenantActor {
    type Reply = Result<String, ReconcileError>;

    async fn handle(
        &mut self,
        _msg: BackupTenant,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.engine.backup(&self.key.tenant, &self.key.host).await
    }
}

impl Message<RestoreTenant> for TenantActor {
    type Reply = Result<OperationResult, ReconcileError>;

    async fn handle(
        &mut self,
        msg: RestoreTenant,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let result = self
            .engine
            .restore(&self.key.tenant, &self.key.host, &msg.backup)
            .await?;
        self.settle(&result);
        Ok(result)
    }
}

impl Message<GetTenantStatus> for TenantActor {
    type Reply = TenantStatus;

    async fn handle(
        &mut self,
        _msg: GetTenantStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        TenantStatus {
            key: self.key.clone(),
            state: self.state,
            last_operation: self.last_operation,
            last_finished: self.last_finished,
        }
    }
}
