//! In-memory policy set and its [`ConfigurationResolver`] implementation.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tracing::{debug, warn};

use sensor_core::{ConfigurationResolver, DetectionPoint, DetectionPointId, Result, SystemId};

use crate::interval::format_interval;
use crate::schema::PolicyDocument;

/// Detection point policies and system groups, keyed by `metadata.id`.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    detection_points: HashMap<DetectionPointId, DetectionPoint>,
    /// Group id -> member systems.
    system_groups: HashMap<String, BTreeSet<SystemId>>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from already validated documents. Disabled documents are
    /// skipped; a later document with a duplicate id replaces the earlier one.
    pub fn from_documents<'a>(docs: impl IntoIterator<Item = &'a PolicyDocument>) -> Self {
        let mut set = Self::new();
        for doc in docs {
            if !doc.metadata().enabled {
                continue;
            }
            match doc {
                PolicyDocument::DetectionPoint(rule) => match rule.to_detection_point() {
                    Ok(dp) => {
                        debug!(
                            detection_point = %dp.label,
                            count = dp.threshold.count.get(),
                            interval = %format_interval(dp.threshold.interval),
                            "detection point configured"
                        );
                        set.insert_detection_point(dp)
                    }
                    Err(e) => warn!(error = %e, "skipping invalid detection point"),
                },
                PolicyDocument::SystemGroup(rule) => {
                    set.insert_system_group(&rule.metadata.id, rule.systems.iter().cloned())
                }
            }
        }
        set
    }

    pub fn insert_detection_point(&mut self, dp: DetectionPoint) {
        if self.detection_points.contains_key(&dp.label) {
            warn!(detection_point = %dp.label, "duplicate detection point, replacing previous policy");
        }
        self.detection_points.insert(dp.label.clone(), dp);
    }

    pub fn insert_system_group(&mut self, id: &str, systems: impl IntoIterator<Item = SystemId>) {
        self.system_groups
            .insert(id.to_string(), systems.into_iter().collect());
    }

    pub fn detection_point(&self, id: &DetectionPointId) -> Option<&DetectionPoint> {
        self.detection_points.get(id)
    }

    /// Transitive closure of `system_id` over all groups sharing members.
    /// Always contains `system_id`.
    pub fn related_systems(&self, system_id: &str) -> BTreeSet<SystemId> {
        let mut closure = BTreeSet::from([system_id.to_string()]);
        let mut pending: Vec<&BTreeSet<SystemId>> = Vec::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();

        loop {
            pending.clear();
            for (group_id, members) in &self.system_groups {
                if visited.contains(group_id.as_str()) {
                    continue;
                }
                if members.iter().any(|m| closure.contains(m)) {
                    visited.insert(group_id.as_str());
                    pending.push(members);
                }
            }
            if pending.is_empty() {
                break;
            }
            for members in &pending {
                closure.extend(members.iter().cloned());
            }
        }

        closure
    }

    pub fn detection_point_count(&self) -> usize {
        self.detection_points.len()
    }

    pub fn system_group_count(&self) -> usize {
        self.system_groups.len()
    }
}

#[async_trait]
impl ConfigurationResolver for PolicySet {
    async fn find_detection_point(&self, id: &DetectionPointId) -> Result<Option<DetectionPoint>> {
        Ok(self.detection_point(id).cloned())
    }

    async fn related_systems(&self, system_id: &str) -> Result<BTreeSet<SystemId>> {
        Ok(PolicySet::related_systems(self, system_id))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sensor_core::Threshold;

    use super::*;

    fn ids(v: &[&str]) -> BTreeSet<SystemId> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unrelated_system_is_its_own_closure() {
        let set = PolicySet::new();
        assert_eq!(set.related_systems("batch"), ids(&["batch"]));
    }

    #[test]
    fn closure_follows_shared_members() {
        let mut set = PolicySet::new();
        set.insert_system_group("web", ids(&["web-1", "web-2"]));
        set.insert_system_group("edge", ids(&["web-2", "waf"]));
        set.insert_system_group("batch", ids(&["cron-1"]));

        let expected = ids(&["waf", "web-1", "web-2"]);
        assert_eq!(set.related_systems("web-1"), expected);
        assert_eq!(set.related_systems("waf"), expected);
        assert_eq!(set.related_systems("cron-1"), ids(&["cron-1"]));
    }

    #[tokio::test]
    async fn resolver_returns_configured_policy() {
        let mut set = PolicySet::new();
        set.insert_detection_point(DetectionPoint::new(
            "IE1",
            Threshold::new(3, Duration::from_secs(60)).unwrap(),
        ));

        let found = set
            .find_detection_point(&DetectionPointId::new("IE1"))
            .await
            .unwrap();
        assert_eq!(found.unwrap().threshold.count.get(), 3);

        let missing = set
            .find_detection_point(&DetectionPointId::new("IE9"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
