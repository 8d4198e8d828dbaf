//! Newline-delimited JSON records.
//!
//! Each line is one [`EventRecord`] or [`AttackRecord`]. Conversion to the
//! typed value parses the timestamp; a malformed timestamp aborts the read
//! with [`SensorError::MalformedTimestamp`] rather than skipping the line.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{error, info};

use sensor_core::{Attack, AttackRecord, Event, EventRecord, Result, SensorError};

/// Read every event from an NDJSON file. Blank lines are ignored.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let events = read_records::<EventRecord, Event>(path)?;
    info!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

/// Read every attack from an NDJSON file. Blank lines are ignored.
pub fn read_attacks(path: &Path) -> Result<Vec<Attack>> {
    let attacks = read_records::<AttackRecord, Attack>(path)?;
    info!(path = %path.display(), count = attacks.len(), "loaded attacks");
    Ok(attacks)
}

/// Write attacks as NDJSON, one record per line.
pub fn write_attacks<W: Write>(mut writer: W, attacks: &[Attack]) -> Result<()> {
    for attack in attacks {
        serde_json::to_writer(&mut writer, &AttackRecord::from(attack.clone()))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn read_records<R, T>(path: &Path) -> Result<Vec<T>>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = SensorError>,
{
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<R>(&line)
            .map_err(SensorError::from)
            .and_then(<T as TryFrom<R>>::try_from);
        match parsed {
            Ok(value) => out.push(value),
            Err(e) => {
                error!(path = %path.display(), line = idx + 1, error = %e, "malformed record");
                return Err(e);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use sensor_core::{DetectionPointId, User};
    use tempfile::TempDir;

    use super::*;

    const EVENTS: &str = r#"{"user":{"username":"bob"},"detection_point":"IE1","timestamp":"2024-05-01T12:00:00Z","detection_system_id":"web-1"}

{"user":{"username":"bob"},"detection_point":"IE1","timestamp":"2024-05-01T12:00:10Z","detection_system_id":"web-2","resource":{"location":"/login"}}
"#;

    #[test]
    fn reads_events_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.ndjson");
        fs::write(&path, EVENTS).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].user, User::new("bob"));
        assert_eq!(
            events[1].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 10).unwrap()
        );
        assert!(events[1].resource.is_some());
    }

    #[test]
    fn malformed_timestamp_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.ndjson");
        fs::write(&path, EVENTS.replace("2024-05-01T12:00:10Z", "May 1st")).unwrap();

        let err = read_events(&path).unwrap_err();
        assert!(matches!(err, SensorError::MalformedTimestamp { .. }));
    }

    #[test]
    fn invalid_json_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.ndjson");
        fs::write(&path, "{not json}\n").unwrap();

        assert!(matches!(read_events(&path).unwrap_err(), SensorError::Serialize(_)));
    }

    #[test]
    fn written_attacks_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("attacks.ndjson");
        let attack = Attack::new(
            User::new("bob"),
            DetectionPointId::new("IE1"),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            "waf",
            None,
        )
        .with_new_id();

        write_attacks(fs::File::create(&path).unwrap(), std::slice::from_ref(&attack)).unwrap();

        let back = read_attacks(&path).unwrap();
        assert_eq!(back, vec![attack.clone()]);
        assert_eq!(back[0].id, attack.id);
    }
}
