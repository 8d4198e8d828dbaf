//! Policy envelope for lightweight first-pass deserialization.

use serde::{Deserialize, Serialize};

use super::{CommonMetadata, PolicyDocument, PolicyKind};

/// Lightweight first-pass deserializer that reads only the header fields.
///
/// Used during two-pass loading: first extract `kind` to determine the
/// concrete type, then deserialize the full document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl PolicyEnvelope {
    /// Parse the `kind` field into a typed [`PolicyKind`].
    pub fn policy_kind(&self) -> std::result::Result<PolicyKind, String> {
        self.kind.parse()
    }

    /// Two-pass: reconstruct the full YAML and deserialize into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<PolicyDocument, String> {
        let kind = self.policy_kind()?;
        let yaml = serde_yaml::to_string(self).map_err(|e| e.to_string())?;
        match kind {
            PolicyKind::DetectionPoint => serde_yaml::from_str(&yaml)
                .map(PolicyDocument::DetectionPoint)
                .map_err(|e| e.to_string()),
            PolicyKind::SystemGroup => serde_yaml::from_str(&yaml)
                .map(PolicyDocument::SystemGroup)
                .map_err(|e| e.to_string()),
        }
    }
}
