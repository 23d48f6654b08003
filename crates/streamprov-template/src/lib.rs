//! streamprov-template: Media application config rendering
//!
//! Pure functions producing the per-tenant artifacts (application
//! descriptor, publish credential file, alias maps) and editing rendered
//! descriptors in place. No I/O.

pub mod artifacts;
pub mod descriptor;
pub mod error;
pub mod macros;
pub mod property;

pub use artifacts::{ApplicationParams, ConfigArtifact, TransferStrategy, render_artifacts};
pub use descriptor::{
    BANDWIDTH_PROPERTIES, PropertyChange, VIEWER_PROPERTIES, read_property, render_descriptor,
    set_properties,
};
pub use error::TemplateError;
pub use property::{Property, PropertyValue};
