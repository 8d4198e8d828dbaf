//! Multi-kind policy document container and accessors.

use super::{CommonMetadata, DetectionPointRule, PolicyKind, SystemGroupRule};

/// A fully deserialized policy of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDocument {
    DetectionPoint(DetectionPointRule),
    SystemGroup(SystemGroupRule),
}

impl PolicyDocument {
    /// Get the document's metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            PolicyDocument::DetectionPoint(rule) => &rule.metadata,
            PolicyDocument::SystemGroup(rule) => &rule.metadata,
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            PolicyDocument::DetectionPoint(_) => PolicyKind::DetectionPoint,
            PolicyDocument::SystemGroup(_) => PolicyKind::SystemGroup,
        }
    }

    pub fn as_detection_point(&self) -> Option<&DetectionPointRule> {
        match self {
            PolicyDocument::DetectionPoint(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_system_group(&self) -> Option<&SystemGroupRule> {
        match self {
            PolicyDocument::SystemGroup(rule) => Some(rule),
            _ => None,
        }
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.metadata().id.trim().is_empty() {
            return Err("metadata.id must not be empty".to_string());
        }
        match self {
            PolicyDocument::DetectionPoint(rule) => rule.to_detection_point().map(|_| ()),
            PolicyDocument::SystemGroup(rule) => {
                if rule.systems.is_empty() {
                    return Err(format!(
                        "system group '{}' must list at least one system",
                        rule.metadata.id
                    ));
                }
                if rule.systems.iter().any(|s| s.trim().is_empty()) {
                    return Err(format!(
                        "system group '{}' contains an empty system id",
                        rule.metadata.id
                    ));
                }
                Ok(())
            }
        }
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        match self {
            PolicyDocument::DetectionPoint(rule) => serde_yaml::to_string(rule),
            PolicyDocument::SystemGroup(rule) => serde_yaml::to_string(rule),
        }
    }
}
