//! Inventory store access

use async_trait::async_trait;
use tracing::debug;

use crate::error::InventoryError;
use crate::types::{HostRecord, TenantRecord};

/// Read access to the platform's host and tenant registry
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Host record by address, active or not
    async fn host(&self, address: &str) -> Result<Option<HostRecord>, InventoryError>;

    /// Names of every valid tenant
    async fn tenant_names(&self) -> Result<Vec<String>, InventoryError>;

    /// Tenant record by name
    async fn tenant(&self, name: &str) -> Result<Option<TenantRecord>, InventoryError>;
}

/// In-memory inventory loaded from configuration
#[derive(Debug, Default)]
pub struct StaticInventory {
    hosts: Vec<HostRecord>,
    tenants: Vec<TenantRecord>,
}

impl StaticInventory {
    #[must_use]
    pub fn new(hosts: Vec<HostRecord>, tenants: Vec<TenantRecord>) -> Self {
        Self { hosts, tenants }
    }
}

#[async_trait]
impl InventoryStore for StaticInventory {
    async fn host(&self, address: &str) -> Result<Option<HostRecord>, InventoryError> {
        Ok(self
            .hosts
            .iter().find(|h| h.address == address).cloned())
    }

    async fn tenant_names(&self) -> Result<Vec<String>, InventoryError> {
        debug!(count = self.tenants.len(), "listing tenant names");
        Ok(self.tenants.iter().map(|t| t.name.clone()).collect())
    }

    async fn tenant(&self, name: &str) -> Result<Option<TenantRecord>, InventoryError> {
        Ok(self
            .tenants
            .iter().find(|t| t.name == name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use streamprov_exec::Secret;

    use super::*;
    use crate::types::ViewerCap;

    fn tenant(name: &str) -> TenantRecord {
        TenantRecord {
            name: name.to_string(),
            bandwidth_kbps: Some(4500),
            viewers: ViewerCap::Unlimited,
            stream_secret: Some(Secret::new("pw")),
            account_password: None,
        }
    }

    #[tokio::test]
    async fn test_lookup() {
        let store = StaticInventory::new(
            vec![HostRecord::with_password("10.0.0.5", "pw")],
            vec![tenant("u1"), tenant("u2")],
        );

        assert!(store.host("10.0.0.5").await.unwrap().is_some());
        assert!(store.host("10.0.0.9").await.unwrap().is_none());
        assert_eq!(store.tenant_names().await.unwrap(), ["u1", "u2"]);
        assert_eq!(store.tenant("u2").await.unwrap().unwrap().name, "u2");
        assert!(store.tenant("u3").await.unwrap().is_none());
    }
}
