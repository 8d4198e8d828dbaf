//! Per-group serialization.
//!
//! Reading existing events and attacks, deciding, and appending an attack is
//! not atomic. Two analyses in the same group running concurrently could both
//! observe the pre-attack state and both append. [`GroupLocks`] hands out one
//! async mutex per [`GroupKey`] so analyses within a group run one at a time
//! while different groups proceed in parallel.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use sensor_core::{DetectionPointId, SearchCriteria, SystemId, User};

/// Identity of a group: user, detection point, and related-system closure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub user: User,
    pub detection_point: DetectionPointId,
    pub systems: BTreeSet<SystemId>,
}

impl From<&SearchCriteria> for GroupKey {
    fn from(criteria: &SearchCriteria) -> Self {
        Self {
            user: criteria.user.clone(),
            detection_point: criteria.detection_point.clone(),
            systems: criteria.detection_system_ids.clone(),
        }
    }
}

/// Table of per-group async mutexes.
///
/// Entries nobody holds or waits on are pruned once the table reaches
/// `prune_threshold` entries.
#[derive(Debug)]
pub struct GroupLocks {
    locks: Mutex<HashMap<GroupKey, Arc<tokio::sync::Mutex<()>>>>,
    prune_threshold: usize,
}

impl GroupLocks {
    pub fn new(prune_threshold: usize) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            prune_threshold: prune_threshold.max(1),
        }
    }

    /// Wait for exclusive access to `key`'s group.
    pub async fn acquire(&self, key: GroupKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("group lock table poisoned");
            if locks.len() >= self.prune_threshold {
                let before = locks.len();
                // A held guard or a pending waiter keeps a second reference.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
                debug!(before, after = locks.len(), "pruned idle group locks");
            }
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of groups currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().expect("group lock table poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GroupLocks {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn key(user: &str) -> GroupKey {
        GroupKey {
            user: User::new(user),
            detection_point: DetectionPointId::new("IE1"),
            systems: BTreeSet::from(["web-1".to_string()]),
        }
    }

    #[tokio::test]
    async fn same_group_waits_for_holder() {
        let locks = GroupLocks::default();
        let guard = locks.acquire(key("bob")).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(key("bob"))).await;
        assert!(blocked.is_err(), "second acquire must wait while the first guard is held");

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(50), locks.acquire(key("bob"))).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn different_groups_do_not_block() {
        let locks = GroupLocks::default();
        let _bob = locks.acquire(key("bob")).await;

        let alice = tokio::time::timeout(Duration::from_millis(50), locks.acquire(key("alice"))).await;
        assert!(alice.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = GroupLocks::new(2);
        drop(locks.acquire(key("a")).await);
        drop(locks.acquire(key("b")).await);
        let _held = locks.acquire(key("c")).await;

        // Table hit the threshold on the third acquire: a and b were idle.
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn key_from_criteria() {
        let criteria = SearchCriteria::new(
            User::new("bob"),
            DetectionPointId::new("IE1"),
            BTreeSet::from(["web-1".to_string()]),
        );
        assert_eq!(GroupKey::from(&criteria), key("bob"));
    }
}
