//! Event analysis: threshold detection over external event and attack stores.
//!
//! This crate provides:
//! - [`EventAnalyzer`], the capability interface analysis engines implement
//! - [`ThresholdEngine`], the repeating-window threshold detector
//! - [`GroupLocks`], per-group serialization of read-decide-append
//! - [`EventPipeline`], the ingestion hook that stores events and runs analyzers

pub mod analyzer;
pub mod engine;
pub mod group;
pub mod pipeline;

pub use analyzer::EventAnalyzer;
pub use engine::{ThresholdEngine, Verdict};
pub use group::{GroupKey, GroupLocks};
pub use pipeline::EventPipeline;
