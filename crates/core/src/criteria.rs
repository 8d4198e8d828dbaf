//! Query shape shared by the event and attack stores.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identity::{DetectionPointId, SystemId, User};
use crate::model::{Attack, Event};

/// Selects events or attacks belonging to one group.
///
/// `detection_system_ids` is the related-system closure of the reporting
/// system, never just the literal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub user: User,
    pub detection_point: DetectionPointId,
    pub detection_system_ids: BTreeSet<SystemId>,
}

impl SearchCriteria {
    pub fn new(
        user: User,
        detection_point: DetectionPointId,
        detection_system_ids: BTreeSet<SystemId>,
    ) -> Self {
        Self {
            user,
            detection_point,
            detection_system_ids,
        }
    }

    /// Criteria for the group of `event`, given its related-system closure.
    pub fn for_event(event: &Event, related_systems: BTreeSet<SystemId>) -> Self {
        Self::new(
            event.user.clone(),
            event.detection_point.clone(),
            related_systems,
        )
    }

    fn matches_fields(
        &self,
        user: &User,
        detection_point: &DetectionPointId,
        system: &SystemId,
    ) -> bool {
        &self.user == user
            && &self.detection_point == detection_point
            && self.detection_system_ids.contains(system)
    }

    pub fn matches_event(&self, event: &Event) -> bool {
        self.matches_fields(&event.user, &event.detection_point, &event.detection_system_id)
    }

    pub fn matches_attack(&self, attack: &Attack) -> bool {
        self.matches_fields(
            &attack.user,
            &attack.detection_point,
            &attack.detection_system_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn systems(ids: &[&str]) -> BTreeSet<SystemId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_any_related_system() {
        let event = Event::new(User::new("bob"), DetectionPointId::new("IE1"), Utc::now(), "web-2");
        let criteria = SearchCriteria::new(
            User::new("bob"),
            DetectionPointId::new("IE1"),
            systems(&["web-1", "web-2"]),
        );
        assert!(criteria.matches_event(&event));
        assert!(criteria.matches_attack(&Attack::from(&event)));
    }

    #[test]
    fn rejects_other_user_point_or_system() {
        let criteria = SearchCriteria::new(
            User::new("bob"),
            DetectionPointId::new("IE1"),
            systems(&["web-1"]),
        );
        let now = Utc::now();
        let other_user = Event::new(User::new("alice"), DetectionPointId::new("IE1"), now, "web-1");
        let other_point = Event::new(User::new("bob"), DetectionPointId::new("IE2"), now, "web-1");
        let other_system = Event::new(User::new("bob"), DetectionPointId::new("IE1"), now, "batch");
        assert!(!criteria.matches_event(&other_user));
        assert!(!criteria.matches_event(&other_point));
        assert!(!criteria.matches_event(&other_system));
    }
}
