//! `SystemGroup` documents.

use serde::{Deserialize, Serialize};

use super::CommonMetadata;

/// Reporting systems that are treated as one logical source when grouping
/// events and attacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SystemGroupRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub systems: Vec<String>,
}
