//! In-memory append-only event and attack stores.

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use sensor_core::{Attack, AttackStore, Event, EventStore, Result, SearchCriteria};

/// Append-only event log held in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn add_event(&self, event: Event) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn find_events(&self, criteria: &SearchCriteria) -> Result<Vec<Event>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| criteria.matches_event(e))
            .cloned()
            .collect())
    }
}

/// Append-only attack log held in memory.
///
/// Every stored attack is assigned a fresh id and published on a broadcast
/// channel so presentation layers can follow new attacks as they land.
#[derive(Debug)]
pub struct InMemoryAttackStore {
    attacks: RwLock<Vec<Attack>>,
    notifier: broadcast::Sender<Attack>,
}

impl InMemoryAttackStore {
    pub fn new(channel_capacity: usize) -> Self {
        let (notifier, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            attacks: RwLock::new(Vec::new()),
            notifier,
        }
    }

    /// Receive every attack appended after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Attack> {
        self.notifier.subscribe()
    }

    /// All stored attacks in append order.
    pub async fn attacks(&self) -> Vec<Attack> {
        self.attacks.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.attacks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.attacks.read().await.is_empty()
    }
}

impl Default for InMemoryAttackStore {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl AttackStore for InMemoryAttackStore {
    async fn add_attack(&self, attack: Attack) -> Result<()> {
        let stored = attack.with_new_id();
        self.attacks.write().await.push(stored.clone());
        // No subscribers is not an error.
        if self.notifier.send(stored).is_err() {
            debug!("attack stored with no subscribers");
        }
        Ok(())
    }

    async fn find_attacks(&self, criteria: &SearchCriteria) -> Result<Vec<Attack>> {
        let attacks = self.attacks.read().await;
        Ok(attacks
            .iter()
            .filter(|a| criteria.matches_attack(a))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use sensor_core::{DetectionPointId, User};

    use super::*;

    fn event(user: &str, system: &str, secs: i64) -> Event {
        Event::new(
            User::new(user),
            DetectionPointId::new("IE1"),
            Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            system,
        )
    }

    fn criteria(user: &str, systems: &[&str]) -> SearchCriteria {
        SearchCriteria::new(
            User::new(user),
            DetectionPointId::new("IE1"),
            systems.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        )
    }

    #[tokio::test]
    async fn find_events_filters_by_criteria() {
        let store = InMemoryEventStore::new();
        store.add_event(event("bob", "web-1", 0)).await.unwrap();
        store.add_event(event("bob", "web-2", 1)).await.unwrap();
        store.add_event(event("alice", "web-1", 2)).await.unwrap();
        store.add_event(event("bob", "batch", 3)).await.unwrap();

        let found = store
            .find_events(&criteria("bob", &["web-1", "web-2"]))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn add_attack_assigns_id_and_notifies() {
        let store = InMemoryAttackStore::new(8);
        let mut rx = store.subscribe();

        let attack = Attack::from(&event("bob", "web-1", 0));
        store.add_attack(attack.clone()).await.unwrap();

        let published = rx.recv().await.unwrap();
        assert!(published.id.is_some());
        assert_eq!(published, attack);

        let found = store.find_attacks(&criteria("bob", &["web-1"])).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, published.id);
        assert!(store
            .find_attacks(&criteria("alice", &["web-1"]))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn add_attack_without_subscribers_succeeds() {
        let store = InMemoryAttackStore::default();
        store
            .add_attack(Attack::from(&event("bob", "web-1", 0)))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }
}
