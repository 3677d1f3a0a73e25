use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::BeneficiaryStatus;

/// A learner enrolled into a programme.
///
/// `learner_id` is unique within a programme, not globally.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Beneficiary {
    pub id: String,
    pub learner_id: String,
    pub programme_id: String,
    pub institution_id: Option<String>,
    pub cohort_code: Option<String>,
    pub district: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub eligibility: serde_json::Value,
    pub status: BeneficiaryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
