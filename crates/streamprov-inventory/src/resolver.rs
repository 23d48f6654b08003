//! Host Resolver

use std::sync::Arc;

use streamprov_exec::HostTarget;
use tracing::{debug, instrument};

use crate::error::InventoryError;
use crate::store::InventoryStore;

/// Turns an address into a connectable target, active hosts only
#[derive(Clone)]
pub struct HostResolver {
    store: Arc<dyn InventoryStore>,
}

impl HostResolver {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Resolve one host. No side effects.
    ///
    /// # Errors
    /// `HostNotFound` for unknown or inactive hosts, `MissingCredential` when
    /// the record has nothing to log in with
    #[instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> Result<HostTarget, InventoryError> {
        let record = self
            .store
            .host(address)
            .await?
            .filter(|h| h.active)
            .ok_or_else(|| InventoryError::HostNotFound(address.to_string()))?;

        let target = HostTarget::new(&record.address, record.credential()?)
            .with_port(record.ssh_port)
            .with_user(&record.user);

        debug!(port = target.port, user = %target.user, "host resolved");
        Ok(target)
    }
}
