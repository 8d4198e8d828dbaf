//! Collaborator traits consumed by analysis engines.
//!
//! Stores and the configuration resolver are external to the decision core;
//! implementations live in `sensor-storage` and `sensor-rules`.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::criteria::SearchCriteria;
use crate::error::Result;
use crate::identity::{DetectionPointId, SystemId};
use crate::model::{Attack, DetectionPoint, Event};

/// Resolves detection point policies and related reporting systems.
#[async_trait]
pub trait ConfigurationResolver: Send + Sync {
    /// The configured policy for `id`, or `None` when unconfigured.
    async fn find_detection_point(&self, id: &DetectionPointId) -> Result<Option<DetectionPoint>>;

    /// Every system treated as the same logical source as `system_id`,
    /// including `system_id` itself.
    async fn related_systems(&self, system_id: &str) -> Result<BTreeSet<SystemId>>;
}

/// Append-only log of events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn add_event(&self, event: Event) -> Result<()>;

    async fn find_events(&self, criteria: &SearchCriteria) -> Result<Vec<Event>>;
}

/// Append-only log of confirmed attacks.
#[async_trait]
pub trait AttackStore: Send + Sync {
    async fn add_attack(&self, attack: Attack) -> Result<()>;

    async fn find_attacks(&self, criteria: &SearchCriteria) -> Result<Vec<Attack>>;
}
