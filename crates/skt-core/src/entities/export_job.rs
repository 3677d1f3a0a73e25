use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BeneficiaryStatus, ExportDestination, ExportFormat, ExportStatus};

/// A request to render programme data into a reporting format.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExportJob {
    pub id: String,
    pub programme_id: String,
    pub format: ExportFormat,
    pub destination: ExportDestination,
    pub status: ExportStatus,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Relative path, e.g. `exports/export_PMKVY01_1736000000000.csv`.
    pub file_path: Option<String>,
    pub error_message: Option<String>,
    pub filters: ExportFilters,
    pub include_pii: bool,
}

/// Beneficiary filters applied while rendering an export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExportFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BeneficiaryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
}
