//! Actor implementations

pub mod tenant;

pub use tenant::{TenantActor, TenantActorArgs};
