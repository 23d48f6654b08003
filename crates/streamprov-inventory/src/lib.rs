//! streamprov-inventory: Hosts and tenants known to the platform
//!
//! Read-only view of the inventory store plus the resolver that turns a host
//! address into a connectable target. Only active hosts resolve.

pub mod error;
pub mod resolver;
pub mod store;
pub mod types;

pub use error::InventoryError;
pub use resolver::HostResolver;
pub use store::{InventoryStore, StaticInventory};
pub use types::{HostRecord, TenantRecord, ViewerCap};
