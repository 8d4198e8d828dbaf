//! Repeating-window threshold detection.
//!
//! For each newly stored event the engine counts the qualifying events in the
//! event's group since the group's most recent attack (optionally bounded by
//! the detection point's interval) and records an attack whenever that count
//! is a multiple of the threshold count. Because counting restarts after each
//! attack, a group keeps producing an attack every `count` qualifying events.

mod window;


use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use sensor_core::{
    Attack, AttackStore, Clock, ConfigurationResolver, Event, EventStore, Result,
    SearchCriteria, Threshold,
};

use crate::analyzer::EventAnalyzer;
use crate::group::{GroupKey, GroupLocks};

pub use window::{count_qualifying, window_start, EPOCH};

/// Outcome of analyzing one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The threshold was crossed; the attack has been appended.
    Violation(Attack),
    /// Not a multiple of the threshold count.
    BelowThreshold { count: usize, threshold: Threshold },
    /// No policy configured for the event's detection point.
    Unconfigured,
}

impl Verdict {
    pub fn is_violation(&self) -> bool {
        matches!(self, Verdict::Violation(_))
    }
}

/// Threshold detection engine over external stores.
pub struct ThresholdEngine {
    clock: Arc<dyn Clock>,
    resolver: Arc<dyn ConfigurationResolver>,
    event_store: Arc<dyn EventStore>,
    attack_store: Arc<dyn AttackStore>,
    groups: GroupLocks,
}

impl ThresholdEngine {
    pub fn new(
        clock: Arc<dyn Clock>,
        resolver: Arc<dyn ConfigurationResolver>,
        event_store: Arc<dyn EventStore>,
        attack_store: Arc<dyn AttackStore>,
    ) -> Self {
        Self {
            clock,
            resolver,
            event_store,
            attack_store,
            groups: GroupLocks::default(),
        }
    }

    /// Replace the group lock table with one pruned at `threshold` entries.
    pub fn with_lock_prune_threshold(mut self, threshold: usize) -> Self {
        self.groups = GroupLocks::new(threshold);
        self
    }

    /// Criteria selecting `event`'s group: same user, same detection point,
    /// any system related to the reporting system.
    async fn group_criteria(&self, event: &Event) -> Result<SearchCriteria> {
        let related = self
            .resolver
            .related_systems(&event.detection_system_id)
            .await?;
        Ok(SearchCriteria::for_event(event, related))
    }

    /// Analyze `event` and report what was decided.
    ///
    /// Holds the event's group lock from the first store read until the
    /// attack (if any) is appended.
    pub async fn evaluate(&self, event: &Event) -> Result<Verdict> {
        let criteria = self.group_criteria(event).await?;
        let _group = self.groups.acquire(GroupKey::from(&criteria)).await;

        let existing_events = self.event_store.find_events(&criteria).await?;

        let detection_point = match self
            .resolver
            .find_detection_point(&event.detection_point)
            .await?
        {
            Some(dp) => dp,
            None => {
                error!(
                    detection_point = %event.detection_point,
                    "could not find detection point configured for this type"
                );
                return Ok(Verdict::Unconfigured);
            }
        };
        let threshold = detection_point.threshold;

        let mut event_count = self
            .count_in_group(&criteria, threshold.interval, &existing_events)
            .await?;

        // The event under analysis has happened even when clock drift or a
        // window boundary hides it from the count.
        if event_count == 0 {
            event_count = 1;
        }

        // 5 % 10 = 5 -> no violation; 10 % 10 = 0 and 30 % 10 = 0 -> violation.
        let threshold_count = threshold.count.get() as usize;
        if event_count % threshold_count == 0 {
            info!(
                user = %event.user,
                detection_point = %event.detection_point,
                count = event_count,
                "violation observed, storing attack"
            );
            let attack = Attack::from(event);
            self.attack_store.add_attack(attack.clone()).await?;
            Ok(Verdict::Violation(attack))
        } else {
            debug!(
                user = %event.user,
                detection_point = %event.detection_point,
                count = event_count,
                threshold = threshold_count,
                "below threshold"
            );
            Ok(Verdict::BelowThreshold {
                count: event_count,
                threshold,
            })
        }
    }

    /// Count the events in `existing_events` that occurred after the most
    /// recent attack in `triggering_event`'s group and, for a non-zero
    /// `interval`, within `interval` of now.
    pub async fn count_events(
        &self,
        interval: Duration,
        existing_events: &[Event],
        triggering_event: &Event,
    ) -> Result<usize> {
        let criteria = self.group_criteria(triggering_event).await?;
        self.count_in_group(&criteria, interval, existing_events).await
    }

    /// Timestamp of the newest attack in `event`'s group, or [`EPOCH`] when
    /// the group has none.
    pub async fn find_most_recent_attack_time(&self, event: &Event) -> Result<DateTime<Utc>> {
        let criteria = self.group_criteria(event).await?;
        self.most_recent_attack_in(&criteria).await
    }

    async fn count_in_group(
        &self,
        criteria: &SearchCriteria,
        interval: Duration,
        existing_events: &[Event],
    ) -> Result<usize> {
        let most_recent_attack = self.most_recent_attack_in(criteria).await?;
        let start = window_start(self.clock.now(), interval);
        Ok(count_qualifying(existing_events, most_recent_attack, start))
    }

    /// Attack lookup against already-resolved criteria, so the lock key, the
    /// event query and the attack query all see the same system set.
    async fn most_recent_attack_in(&self, criteria: &SearchCriteria) -> Result<DateTime<Utc>> {
        let attacks = self.attack_store.find_attacks(criteria).await?;
        Ok(attacks
            .iter()
            .map(|a| a.timestamp)
            .max()
            .unwrap_or(EPOCH))
    }
}

#[async_trait]
impl EventAnalyzer for ThresholdEngine {
    async fn analyze(&self, event: &Event) -> Result<()> {
        self.evaluate(event).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "threshold"
    }
}
