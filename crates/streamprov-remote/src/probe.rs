//! Existence predicate parsed from probe output

use serde::Serialize;

use crate::error::RemoteError;

/// Marker printed when the probed thing is there
pub const EXISTS: &str = "exists";
/// Marker printed when it is not
pub const NOT_FOUND: &str = "not found";

/// Outcome of an existence probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Exists,
    Missing,
}

impl Presence {
    /// Parse a probe's stdout
    ///
    /// # Errors
    /// Returns `UnexpectedOutput` for anything other than the two markers
    pub fn parse(probe: &'static str, output: &str) -> Result<Self, RemoteError> {
        match output.trim() {
            EXISTS => Ok(Presence::Exists),
            NOT_FOUND => Ok(Presence::Missing),
            other => Err(RemoteError::UnexpectedOutput {
                probe,
                output: other.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn exists(self) -> bool {
        self == Presence::Exists
    }
}
