//! YAML DSL schema types with serde deserialization.
//!
//! Defines the type hierarchy for policy documents:
//! - `PolicyEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `PolicyDocument`: enum dispatching to kind-specific types
//! - `DetectionPointRule`: threshold policy for one detection point
//! - `SystemGroupRule`: reporting systems treated as one logical source

mod detection_point;
mod document;
mod envelope;
mod kind;
mod metadata;
mod system_group;

pub use detection_point::*;
pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use metadata::*;
pub use system_group::*;
