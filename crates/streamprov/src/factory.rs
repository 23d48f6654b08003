//! Executor factory picking SSH, local or simulated execution per host

use std::sync::Arc;

use async_trait::async_trait;
use streamprov_core::ExecutorFactory;
use streamprov_exec::{
    ExecutionMode, HostTarget, LocalExecutor, RemoteExecutor, SimulatedExecutor, SshExecutor,
    Timeouts,
};
use tracing::debug;

/// Default implementation of `ExecutorFactory`
pub struct DefaultExecutorFactory {
    mode: ExecutionMode,
    timeouts: Timeouts,
}

impl DefaultExecutorFactory {
    /// Create a new factory instance
    #[must_use]
    pub fn new(mode: ExecutionMode, timeouts: Timeouts) -> Self {
        Self { mode, timeouts }
    }

    fn build(&self, target: &HostTarget) -> Arc<dyn RemoteExecutor> {
        if self.mode == ExecutionMode::Simulated {
            return Arc::new(SimulatedExecutor::new());
        }

        // For localhost connections, use LocalExecutor
        if target.is_local() {
            return Arc::new(LocalExecutor::new(self.timeouts.exec));
        }

        Arc::new(SshExecutor::new(target.clone(), self.timeouts))
    }
}

#[async_trait]
impl ExecutorFactory for DefaultExecutorFactory {
    async fn create_executor(&self, target: &HostTarget) -> Arc<dyn RemoteExecutor> {
        let executor = self.build(target);
        debug!(
            address = %target.address,
            executor = executor.executor_type(),
            "executor created"
        );
        executor
    }

    fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use streamprov_exec::{Credential, Secret};

    use super::*;

    fn target(address: &str) -> HostTarget {
        HostTarget::new(address, Credential::Password(Secret::new("pw")))
    }

    #[tokio::test]
    async fn test_executor_selection() {
        let live = DefaultExecutorFactory::new(ExecutionMode::Live, Timeouts::default());
        assert_eq!(
            live.create_executor(&target("127.0.0.1")).await.executor_type(),
            "local"
        );
        assert_eq!(
            live.create_executor(&target("10.0.0.5")).await.executor_type(),
            "ssh"
        );

        let simulated = DefaultExecutorFactory::new(ExecutionMode::Simulated, Timeouts::default());
        assert_eq!(
            simulated
                .create_executor(&target("10.0.0.5"))
                .await
                .executor_type(),
            "simulated"
        );
        assert_eq!(simulated.mode(), ExecutionMode::Simulated);
    }
}
