//! Ingestion hook: store an event, then notify every registered analyzer.
//!
//! Analyzers run in registration order. A failing analyzer does not stop the
//! ones after it; the first failure is returned once all have run.

use std::sync::Arc;

use tracing::{info, warn};

use sensor_core::{Attack, AttackStore, Event, EventStore, Result};

use crate::analyzer::EventAnalyzer;

pub struct EventPipeline {
    event_store: Arc<dyn EventStore>,
    attack_store: Arc<dyn AttackStore>,
    analyzers: Vec<Arc<dyn EventAnalyzer>>,
}

impl EventPipeline {
    pub fn new(event_store: Arc<dyn EventStore>, attack_store: Arc<dyn AttackStore>) -> Self {
        Self {
            event_store,
            attack_store,
            analyzers: Vec::new(),
        }
    }

    /// Register an analyzer to be notified of every stored event.
    pub fn register(&mut self, analyzer: Arc<dyn EventAnalyzer>) {
        info!(analyzer = analyzer.name(), "registered event analyzer");
        self.analyzers.push(analyzer);
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn EventAnalyzer>) -> Self {
        self.register(analyzer);
        self
    }

    pub fn analyzer_count(&self) -> usize {
        self.analyzers.len()
    }

    /// Append `event` to the event store, then run every analyzer on it.
    pub async fn add_event(&self, event: Event) -> Result<()> {
        self.event_store.add_event(event.clone()).await?;

        let mut first_error = None;
        for analyzer in &self.analyzers {
            if let Err(e) = analyzer.analyze(&event).await {
                warn!(
                    analyzer = analyzer.name(),
                    user = %event.user,
                    detection_point = %event.detection_point,
                    error = %e,
                    "event analysis failed"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Append an attack detected outside this pipeline (WAF, IDS, ...).
    pub async fn add_attack(&self, attack: Attack) -> Result<()> {
        info!(
            user = %attack.user,
            detection_point = %attack.detection_point,
            system = %attack.detection_system_id,
            "recording external attack"
        );
        self.attack_store.add_attack(attack).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use sensor_core::{DetectionPointId, SensorError, User};
    use sensor_storage::{InMemoryAttackStore, InMemoryEventStore};

    use super::*;

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Counting {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl EventAnalyzer for Counting {
        async fn analyze(&self, _event: &Event) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SensorError::Store("attack store offline".into()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn event() -> Event {
        Event::new(User::new("bob"), DetectionPointId::new("IE1"), Utc::now(), "web-1")
    }

    #[tokio::test]
    async fn stores_event_before_analysis() {
        let events = Arc::new(InMemoryEventStore::new());
        let analyzer = Counting::new(false);
        let pipeline = EventPipeline::new(events.clone(), Arc::new(InMemoryAttackStore::default()))
            .with_analyzer(analyzer.clone());

        pipeline.add_event(event()).await.unwrap();
        assert_eq!(events.len().await, 1);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_analyzer_does_not_skip_others() {
        let failing = Counting::new(true);
        let healthy = Counting::new(false);
        let pipeline = EventPipeline::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryAttackStore::default()),
        )
        .with_analyzer(failing.clone())
        .with_analyzer(healthy.clone());

        let err = pipeline.add_event(event()).await.unwrap_err();
        assert!(matches!(err, SensorError::Store(_)));
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.analyzer_count(), 2);
    }

    #[tokio::test]
    async fn external_attacks_go_straight_to_the_store() {
        let attacks = Arc::new(InMemoryAttackStore::default());
        let pipeline = EventPipeline::new(Arc::new(InMemoryEventStore::new()), attacks.clone());

        pipeline.add_attack(Attack::from(&event())).await.unwrap();
        assert_eq!(attacks.len().await, 1);
    }
}
