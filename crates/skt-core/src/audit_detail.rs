//! Typed audit `meta` payloads.
//!
//! Each audit action carries a structured `meta` JSON blob. These types fix
//! the shape per action and provide schema validation for them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{
    BeneficiaryStatus, EvidenceType, ExportDestination, ExportFormat, FundingRuleType,
    MilestoneType, PlacementStatus, TargetMetric,
};

/// Meta for `CREATE_PROGRAMME` and `DELETE_PROGRAMME`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ProgrammeDetail {
    pub programme_name: String,
    pub programme_code: String,
}

/// Meta for `UPDATE_PROGRAMME`: the changed fields as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProgrammeChangesDetail {
    pub changes: serde_json::Value,
}

/// Meta for `ADD_TARGET`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TargetDetail {
    pub metric: TargetMetric,
    pub target_value: f64,
}

/// Meta for `ADD_FUNDING_RULE`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FundingRuleDetail {
    pub rule_type: FundingRuleType,
    pub amount: f64,
}

/// Meta for `ADD_BENEFICIARY`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BeneficiaryAddedDetail {
    pub learner_id: String,
}

/// Meta for `UPDATE_BENEFICIARY_STATUS`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub old_status: BeneficiaryStatus,
    pub new_status: BeneficiaryStatus,
}

/// Meta for `BULK_IMPORT_BENEFICIARIES`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BulkImportDetail {
    pub total_rows: u64,
    pub successful: u64,
    pub failed: u64,
    pub filename: String,
}

/// Meta for `UPDATE_PROGRESS`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProgressDetail {
    pub training_pct: f64,
    pub last_skillscore: Option<f64>,
    pub milestone: Option<MilestoneType>,
}

/// Meta for `ADD_PLACEMENT`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PlacementDetail {
    pub status: PlacementStatus,
    pub employer_id: Option<String>,
    pub ctc: Option<f64>,
}

/// Meta for `GENERATE_EVIDENCE_BUNDLE`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvidenceRequestedDetail {
    #[serde(rename = "type")]
    pub bundle_type: EvidenceType,
    pub beneficiary_id: Option<String>,
    pub expires_in_days: u32,
}

/// Meta for `DOWNLOAD_EVIDENCE_BUNDLE`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvidenceDownloadedDetail {
    pub download_count: u32,
}

/// Meta for `CREATE_EXPORT_JOB`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExportRequestedDetail {
    pub format: ExportFormat,
    pub destination: ExportDestination,
    pub include_pii: bool,
}

/// Meta for `DOWNLOAD_EXPORT`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExportDownloadedDetail {
    pub format: ExportFormat,
    pub include_pii: bool,
}
