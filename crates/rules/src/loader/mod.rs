//! Filesystem policy loader with hot-reload via `notify` watcher.
//!
//! Watches the rules directory for YAML file changes (create, modify, delete)
//! and rebuilds the in-memory [`PolicySet`](crate::PolicySet) after each one.
//! Supports all policy kinds via two-pass deserialization
//! (PolicyEnvelope -> PolicyDocument).

mod core;
mod error;
mod watcher;


pub use self::core::PolicyLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
