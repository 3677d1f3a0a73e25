use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::TargetMetric;

/// Outcome goal for a programme. At most one per metric.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProgrammeTarget {
    pub id: String,
    pub programme_id: String,
    pub metric: TargetMetric,
    pub target_value: f64,
    pub created_at: DateTime<Utc>,
}
