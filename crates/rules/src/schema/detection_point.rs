//! `DetectionPoint` documents: a label plus its threshold policy.

use serde::{Deserialize, Serialize};
use sensor_core::{DetectionPoint, Threshold};

use super::CommonMetadata;
use crate::interval::parse_interval;

/// Threshold policy for a single detection point, parsed from YAML.
///
/// ```yaml
/// apiVersion: v1
/// kind: DetectionPoint
/// metadata:
///   id: IE1
///   name: Cross Site Scripting Attempt
/// threshold:
///   count: 3
///   interval: 5m
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectionPointRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub threshold: ThresholdSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdSpec {
    pub count: u32,
    /// Duration string (`"5m"`, `"2h30m"`); `"0"` means unbounded.
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_interval() -> String {
    "0".to_string()
}

impl DetectionPointRule {
    /// Build the core policy value, validating count and interval.
    pub fn to_detection_point(&self) -> std::result::Result<DetectionPoint, String> {
        let interval = parse_interval(&self.threshold.interval).ok_or_else(|| {
            format!(
                "detection point '{}': invalid interval '{}'",
                self.metadata.id, self.threshold.interval
            )
        })?;
        let threshold = Threshold::new(self.threshold.count, interval)
            .map_err(|e| format!("detection point '{}': {}", self.metadata.id, e))?;
        Ok(DetectionPoint::new(self.metadata.id.clone(), threshold))
    }
}
