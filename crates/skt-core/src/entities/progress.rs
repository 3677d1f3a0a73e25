use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::MilestoneType;

/// Training progress of one beneficiary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProgressRecord {
    pub id: String,
    pub beneficiary_id: String,
    /// 0 to 100.
    pub training_pct: f64,
    pub last_assessment_id: Option<String>,
    /// 0 to 100, absent until the first assessment.
    pub last_skillscore: Option<f64>,
    pub last_updated: DateTime<Utc>,
    pub milestones: Vec<Milestone>,
}

/// A milestone appended to a progress record. Never removed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Milestone {
    #[serde(rename = "type")]
    pub milestone_type: MilestoneType,
    pub achieved_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}
