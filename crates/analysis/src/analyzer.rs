use async_trait::async_trait;

use sensor_core::{Event, Result};

/// An analysis engine notified once per newly stored event.
///
/// Engines are registered with the [`EventPipeline`](crate::EventPipeline)
/// at composition time and are interchangeable.
#[async_trait]
pub trait EventAnalyzer: Send + Sync {
    /// Analyze an event that has already been appended to the event store.
    ///
    /// May append attacks as a side effect. Store and resolver failures are
    /// returned to the caller.
    async fn analyze(&self, event: &Event) -> Result<()>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
