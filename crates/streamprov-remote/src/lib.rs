//! streamprov-remote: File placement and service control on media hosts
//!
//! Builds the shell commands issued to a host and interprets their output:
//! existence probes, the two-strategy file writer, and the systemd service
//! controller with post-restart verification.

pub mod commands;
pub mod error;
pub mod probe;
pub mod service;
pub mod types;
pub mod writer;

pub use error::RemoteError;
pub use probe::Presence;
pub use service::{ServiceController, SystemdController};
pub use types::ServiceStatus;
pub use writer::RemoteFileWriter;
