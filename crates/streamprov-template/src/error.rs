//! Error types for streamprov-template

use thiserror::Error;

/// Errors raised while editing a rendered descriptor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No `<Property>` block carries this name
    #[error("property not found: {0}")]
    PropertyNotFound(String),

    /// A property block is missing its `<Value>` element
    #[error("malformed property block: {0}")]
    MalformedProperty(String),
}
