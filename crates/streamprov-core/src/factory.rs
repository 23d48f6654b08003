//! Executor construction seam

use std::sync::Arc;

use async_trait::async_trait;
use streamprov_exec::{ExecutionMode, HostTarget, RemoteExecutor};

/// Creates the executor used for one resolved host
///
/// Allows injection of SSH, local, simulated or scripted executors.
#[async_trait]
pub trait ExecutorFactory: Send + Sync {
    /// Create an executor bound to `target`
    async fn create_executor(&self, target: &HostTarget) -> Arc<dyn RemoteExecutor>;

    /// Whether created executors reach real hosts
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Live
    }
}
