//! Event and attack storage.
//!
//! In-memory append-only stores implementing the `sensor-core` store traits,
//! plus NDJSON helpers that turn raw records into typed values (the single
//! place timestamps are parsed).

pub mod memory;
pub mod ndjson;

pub use memory::{InMemoryAttackStore, InMemoryEventStore};
pub use ndjson::{read_attacks, read_events, write_attacks};
