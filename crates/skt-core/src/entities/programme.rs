use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ProgrammeStatus, SponsorType};

/// A funded skilling scheme, sponsored by a government body or a CSR partner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Programme {
    pub id: String,
    pub sponsor_type: SponsorType,
    pub name: String,
    /// Short unique code, e.g. `PMKVY-PUNE-25`.
    pub code: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    /// Never earlier than `start_date`.
    pub end_date: DateTime<Utc>,
    pub sectors: Vec<String>,
    pub districts: Vec<String>,
    pub created_by: String,
    pub status: ProgrammeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
