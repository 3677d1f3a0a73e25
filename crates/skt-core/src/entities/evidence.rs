use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EvidenceItemKind, EvidenceStatus, EvidenceType};

/// A generated manifest of checksummed records, downloadable until `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EvidenceBundle {
    pub id: String,
    pub programme_id: String,
    pub beneficiary_id: Option<String>,
    #[serde(rename = "type")]
    pub bundle_type: EvidenceType,
    /// Empty while `GENERATING`.
    pub items: Vec<EvidenceItem>,
    pub generated_at: DateTime<Utc>,
    pub requested_by: String,
    pub expires_at: DateTime<Utc>,
    pub status: EvidenceStatus,
    pub download_count: u32,
    /// Bytes. Set when the bundle becomes `READY`.
    pub file_size: Option<u64>,
    pub error_message: Option<String>,
}

impl EvidenceBundle {
    /// Whether the bundle is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// One record captured in an evidence bundle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvidenceItem {
    #[serde(rename = "type")]
    pub kind: EvidenceItemKind,
    pub url: String,
    pub ts: DateTime<Utc>,
    /// MD5 hex digest of the record's JSON.
    pub checksum: Option<String>,
}
