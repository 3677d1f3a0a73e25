use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::PlacementStatus;

/// A job placement for a beneficiary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PlacementRecord {
    pub id: String,
    pub beneficiary_id: String,
    pub job_id: Option<String>,
    pub employer_id: Option<String>,
    pub offer_date: Option<DateTime<Utc>>,
    pub join_date: Option<DateTime<Utc>>,
    /// Annual cost to company.
    pub ctc: Option<f64>,
    pub currency: String,
    pub location: Option<String>,
    pub retained_30d: bool,
    pub retained_90d: bool,
    pub status: PlacementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
