//! Event, attack and policy value types.
//!
//! Timestamps are parsed exactly once, when a raw [`EventRecord`] or
//! [`AttackRecord`] crosses into one of the typed values below. Everything
//! downstream works on [`DateTime<Utc>`].

use std::hash::{Hash, Hasher};
use std::num::NonZeroU32;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SensorError};
use crate::identity::{AttackId, DetectionPointId, Resource, SystemId, User};

/// Parse an RFC 3339 timestamp into a UTC instant.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| SensorError::MalformedTimestamp {
            value: value.to_string(),
            source,
        })
}

/// Render an instant in the canonical wire format (`2024-05-01T12:00:00Z`).
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ── Event ─────────────────────────────────────────────────────

/// A single suspicious-activity observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct Event {
    pub user: User,
    pub detection_point: DetectionPointId,
    pub timestamp: DateTime<Utc>,
    pub detection_system_id: SystemId,
    pub resource: Option<Resource>,
}

impl Event {
    pub fn new(
        user: User,
        detection_point: DetectionPointId,
        timestamp: DateTime<Utc>,
        detection_system_id: impl Into<SystemId>,
    ) -> Self {
        Self {
            user,
            detection_point,
            timestamp,
            detection_system_id: detection_system_id.into(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }
}

/// Wire shape of an event, timestamp still unparsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub user: User,
    pub detection_point: DetectionPointId,
    pub timestamp: String,
    pub detection_system_id: SystemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

impl TryFrom<EventRecord> for Event {
    type Error = SensorError;

    fn try_from(record: EventRecord) -> Result<Self> {
        Ok(Self {
            timestamp: parse_timestamp(&record.timestamp)?,
            user: record.user,
            detection_point: record.detection_point,
            detection_system_id: record.detection_system_id,
            resource: record.resource,
        })
    }
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        Self {
            timestamp: format_timestamp(&event.timestamp),
            user: event.user,
            detection_point: event.detection_point,
            detection_system_id: event.detection_system_id,
            resource: event.resource,
        }
    }
}

// ── Attack ────────────────────────────────────────────────────

/// A confirmed violation.
///
/// Produced either by an analysis engine from the event that crossed a
/// threshold, or by an external detection system (WAF, IDS) and appended to
/// the attack store directly. Equality and hashing ignore `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AttackRecord", into = "AttackRecord")]
pub struct Attack {
    /// Assigned by the attack store on append.
    pub id: Option<AttackId>,
    pub user: User,
    pub detection_point: DetectionPointId,
    pub timestamp: DateTime<Utc>,
    pub detection_system_id: SystemId,
    pub resource: Option<Resource>,
}

impl Attack {
    pub fn new(
        user: User,
        detection_point: DetectionPointId,
        timestamp: DateTime<Utc>,
        detection_system_id: impl Into<SystemId>,
        resource: Option<Resource>,
    ) -> Self {
        Self {
            id: None,
            user,
            detection_point,
            timestamp,
            detection_system_id: detection_system_id.into(),
            resource,
        }
    }

    /// Copy of this attack carrying a fresh storage identifier.
    pub fn with_new_id(mut self) -> Self {
        self.id = Some(Uuid::new_v4());
        self
    }
}

impl From<&Event> for Attack {
    fn from(event: &Event) -> Self {
        Self::new(
            event.user.clone(),
            event.detection_point.clone(),
            event.timestamp,
            event.detection_system_id.clone(),
            event.resource.clone(),
        )
    }
}

impl PartialEq for Attack {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user
            && self.detection_point == other.detection_point
            && self.timestamp == other.timestamp
            && self.detection_system_id == other.detection_system_id
            && self.resource == other.resource
    }
}

impl Eq for Attack {}

impl Hash for Attack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user.hash(state);
        self.detection_point.hash(state);
        self.timestamp.hash(state);
        self.detection_system_id.hash(state);
        self.resource.hash(state);
    }
}

impl std::fmt::Display for Attack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attack(user={}, detection_point={}, system={}, at={})",
            self.user,
            self.detection_point,
            self.detection_system_id,
            format_timestamp(&self.timestamp)
        )
    }
}

/// Wire shape of an attack, timestamp still unparsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AttackId>,
    pub user: User,
    pub detection_point: DetectionPointId,
    pub timestamp: String,
    pub detection_system_id: SystemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

impl TryFrom<AttackRecord> for Attack {
    type Error = SensorError;

    fn try_from(record: AttackRecord) -> Result<Self> {
        Ok(Self {
            timestamp: parse_timestamp(&record.timestamp)?,
            id: record.id,
            user: record.user,
            detection_point: record.detection_point,
            detection_system_id: record.detection_system_id,
            resource: record.resource,
        })
    }
}

impl From<Attack> for AttackRecord {
    fn from(attack: Attack) -> Self {
        Self {
            timestamp: format_timestamp(&attack.timestamp),
            id: attack.id,
            user: attack.user,
            detection_point: attack.detection_point,
            detection_system_id: attack.detection_system_id,
            resource: attack.resource,
        }
    }
}

// ── Policy ────────────────────────────────────────────────────

/// How many qualifying events within what interval constitute a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub count: NonZeroU32,
    /// `Duration::ZERO` means unbounded: every qualifying event counts.
    pub interval: Duration,
}

impl Threshold {
    /// Build a threshold, rejecting a zero count.
    pub fn new(count: u32, interval: Duration) -> Result<Self> {
        let count = NonZeroU32::new(count)
            .ok_or_else(|| SensorError::Config("threshold count must be positive".to_string()))?;
        Ok(Self { count, interval })
    }

    pub fn is_unbounded(&self) -> bool {
        self.interval.is_zero()
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unbounded() {
            write!(f, "{} events (unbounded)", self.count)
        } else {
            write!(f, "{} events in {}s", self.count, self.interval.as_secs())
        }
    }
}

/// A configured behavior signature and its threshold policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionPoint {
    pub label: DetectionPointId,
    pub threshold: Threshold,
}

impl DetectionPoint {
    pub fn new(label: impl Into<String>, threshold: Threshold) -> Self {
        Self {
            label: DetectionPointId::new(label),
            threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event() -> Event {
        Event::new(
            User::new("bob"),
            DetectionPointId::new("IE1"),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            "web-1",
        )
    }

    #[test]
    fn parse_timestamp_normalizes_offset_to_utc() {
        let ts = parse_timestamp("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, SensorError::MalformedTimestamp { ref value, .. } if value == "yesterday"));
    }

    #[test]
    fn event_deserializes_from_record_json() {
        let json = r#"{"user":{"username":"bob"},"detection_point":"IE1",
            "timestamp":"2024-05-01T12:00:00Z","detection_system_id":"web-1"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event, sample_event());
    }

    #[test]
    fn event_with_bad_timestamp_fails_to_deserialize() {
        let json = r#"{"user":{"username":"bob"},"detection_point":"IE1",
            "timestamp":"not-a-time","detection_system_id":"web-1"}"#;
        let err = serde_json::from_str::<Event>(json).unwrap_err();
        assert!(err.to_string().contains("Malformed timestamp"));
    }

    #[test]
    fn event_serializes_with_canonical_timestamp() {
        let value = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00Z");
        assert!(value.get("resource").is_none());
    }

    #[test]
    fn attack_from_event_copies_fields() {
        let event = sample_event().with_resource(Resource::new("/login"));
        let attack = Attack::from(&event);
        assert_eq!(attack.user, event.user);
        assert_eq!(attack.timestamp, event.timestamp);
        assert_eq!(attack.resource, Some(Resource::new("/login")));
        assert!(attack.id.is_none());
    }

    #[test]
    fn attack_equality_ignores_id() {
        let attack = Attack::from(&sample_event());
        let stored = attack.clone().with_new_id();
        assert!(stored.id.is_some());
        assert_eq!(attack, stored);
    }

    #[test]
    fn threshold_rejects_zero_count() {
        assert!(Threshold::new(0, Duration::ZERO).is_err());
        let t = Threshold::new(3, Duration::ZERO).unwrap();
        assert!(t.is_unbounded());
        assert_eq!(t.count.get(), 3);
    }
}
