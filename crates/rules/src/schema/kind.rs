//! Policy kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported policy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    DetectionPoint,
    SystemGroup,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::DetectionPoint => write!(f, "DetectionPoint"),
            PolicyKind::SystemGroup => write!(f, "SystemGroup"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DetectionPoint" => Ok(PolicyKind::DetectionPoint),
            "SystemGroup" => Ok(PolicyKind::SystemGroup),
            other => Err(format!("unknown policy kind: '{}'", other)),
        }
    }
}
