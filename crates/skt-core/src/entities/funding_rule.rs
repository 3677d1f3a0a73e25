use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::FundingRuleType;

/// A payout rule used for cost projections.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FundingRule {
    pub id: String,
    pub programme_id: String,
    pub rule_type: FundingRuleType,
    /// Amount paid per eligible beneficiary.
    pub amount: f64,
    pub currency: String,
    /// Free-form JSON object describing eligibility conditions.
    pub conditions: serde_json::Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
