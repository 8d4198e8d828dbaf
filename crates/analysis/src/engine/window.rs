//! Counting-window arithmetic.

use std::time::Duration;

use chrono::{DateTime, Utc};

use sensor_core::Event;

/// Cutoff used when a group has no recorded attack: the earliest
/// representable instant.
pub const EPOCH: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

/// Start of the counting window ending at `now`.
///
/// `None` for a zero interval, which counts events of any age. An interval
/// reaching past the representable range starts at [`EPOCH`].
pub fn window_start(now: DateTime<Utc>, interval: Duration) -> Option<DateTime<Utc>> {
    if interval.is_zero() {
        return None;
    }
    let start = chrono::Duration::from_std(interval)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(EPOCH);
    Some(start)
}

/// Count events strictly after `most_recent_attack` and, when a window is
/// set, strictly after `window_start`.
pub fn count_qualifying(
    events: &[Event],
    most_recent_attack: DateTime<Utc>,
    window_start: Option<DateTime<Utc>>,
) -> usize {
    events
        .iter()
        .filter(|e| e.timestamp > most_recent_attack)
        .filter(|e| window_start.map_or(true, |start| e.timestamp > start))
        .count()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sensor_core::{DetectionPointId, User};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn events(offsets: &[i64]) -> Vec<Event> {
        offsets
            .iter()
            .map(|&s| Event::new(User::new("bob"), DetectionPointId::new("IE1"), at(s), "web-1"))
            .collect()
    }

    #[test]
    fn zero_interval_has_no_window() {
        assert_eq!(window_start(at(100), Duration::ZERO), None);
    }

    #[test]
    fn window_start_subtracts_interval() {
        assert_eq!(window_start(at(100), Duration::from_secs(60)), Some(at(40)));
    }

    #[test]
    fn huge_interval_saturates_to_epoch() {
        assert_eq!(window_start(at(0), Duration::from_secs(u64::MAX)), Some(EPOCH));
    }

    #[test]
    fn unbounded_counts_everything_after_attack() {
        let evs = events(&[0, 10, 20, 30]);
        assert_eq!(count_qualifying(&evs, EPOCH, None), 4);
        assert_eq!(count_qualifying(&evs, at(10), None), 2);
    }

    #[test]
    fn attack_cutoff_is_strict() {
        let evs = events(&[20, 30]);
        assert_eq!(count_qualifying(&evs, at(20), None), 1);
    }

    #[test]
    fn window_start_is_strict() {
        let evs = events(&[40, 41, 100]);
        assert_eq!(count_qualifying(&evs, EPOCH, Some(at(40))), 2);
    }

    #[test]
    fn both_filters_apply() {
        let evs = events(&[0, 50, 70, 90]);
        // attack at 60 removes 0 and 50; window from 80 removes 70.
        assert_eq!(count_qualifying(&evs, at(60), Some(at(80))), 1);
    }

    #[test]
    fn nothing_qualifies() {
        assert_eq!(count_qualifying(&[], EPOCH, None), 0);
        assert_eq!(count_qualifying(&events(&[5]), at(5), None), 0);
    }
}
