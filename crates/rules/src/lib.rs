//! Detection policy configuration.
//!
//! This crate provides:
//! - YAML policy documents (`DetectionPoint`, `SystemGroup`) with two-pass
//!   serde deserialization
//! - Filesystem loader with hot-reload via `notify` watcher
//! - [`PolicySet`], the in-memory configuration resolver: threshold lookup
//!   and related-system closure

pub mod interval;
pub mod loader;
pub mod policy;
pub mod schema;

pub use loader::{LoadResult, LoadStatus, PolicyLoader, RuleError};
pub use policy::PolicySet;
