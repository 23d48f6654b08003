//! streamprov-exec: Remote command execution
//!
//! Runs exactly one shell command per call against a media host, either over
//! a fresh SSH session, on the local machine, or against a simulated host.

pub mod error;
pub mod keys;
pub mod local;
pub mod result;
pub mod simulated;
pub mod ssh;
pub mod traits;

pub use error::{ExecError, ExecErrorKind};
pub use keys::{Credential, KeyError, ResolvedKey, Secret};
pub use local::LocalExecutor;
pub use result::{CommandResult, HostTarget, Timeouts};
pub use simulated::{ExecutionMode, SimulatedExecutor};
pub use ssh::SshExecutor;
pub use traits::RemoteExecutor;
