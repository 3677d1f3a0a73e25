//! Response shapes returned by the REST API and the `skt` CLI.
//!
//! These structs define the `data` payload of the `{success, data}` envelope
//! for list, detail, dashboard, import, and job-acknowledgement endpoints.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Beneficiary, PlacementRecord, ProgressRecord};
use crate::enums::{BeneficiaryStatus, EvidenceStatus, ExportFormat, FundingRuleType};

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Page position reported alongside list results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: u64,
}

impl Pagination {
    /// `pages = ceil(total / limit)`. A zero limit yields zero pages.
    #[must_use]
    pub fn new(current: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
        };
        Self {
            current,
            pages,
            total,
        }
    }
}

/// Requested page of a list endpoint. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp raw query values: page at least 1, limit within `1..=max_limit`.
    #[must_use]
    pub fn clamped(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Beneficiaries
// ---------------------------------------------------------------------------

/// A beneficiary with its progress record and latest placement.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BeneficiaryDetail {
    #[serde(flatten)]
    pub beneficiary: Beneficiary,
    pub progress_record: Option<ProgressRecord>,
    pub placement_record: Option<PlacementRecord>,
}

/// A CSV row that could not be imported.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImportRowError {
    /// 1-based data row number (the header is not counted).
    pub row: u64,
    pub error: String,
    /// The row as parsed, keyed by header.
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of a CSV beneficiary import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImportReport {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub errors: Vec<ImportRowError>,
}

// ---------------------------------------------------------------------------
// Impact
// ---------------------------------------------------------------------------

/// A count measured against its target.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct KpiProgress {
    pub value: u64,
    pub target: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MedianKpi {
    pub median: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ValueKpi {
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DashboardKpis {
    pub trained: KpiProgress,
    pub certified: KpiProgress,
    pub placed: KpiProgress,
    pub skillscore_uplift: MedianKpi,
    pub median_ctc: ValueKpi,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DistrictBreakdown {
    pub code: String,
    pub certified: u64,
    pub placed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Breakdown {
    pub by_district: Vec<DistrictBreakdown>,
}

/// Enrolments on one calendar day (UTC).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TrendPoint {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

/// Response from `GET /api/impact/dashboard/{programmeId}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Dashboard {
    pub period: String,
    pub kpis: DashboardKpis,
    pub breakdown: Breakdown,
    pub trends: Vec<TrendPoint>,
}

/// Projected payout of one active funding rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CostLine {
    pub rule_type: FundingRuleType,
    pub amount_per_unit: f64,
    pub eligible_count: u64,
    pub total_potential: f64,
    pub currency: String,
}

/// Response from `GET /api/impact/cost-kpis/{programmeId}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CostKpis {
    pub cost_breakdown: Vec<CostLine>,
    pub total_potential_cost: f64,
    pub currency: String,
}

/// Status counts of a programme's beneficiaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub enrolled: u64,
    pub training: u64,
    pub certified: u64,
    pub placed: u64,
    pub dropped: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: BeneficiaryStatus, count: u64) {
        match status {
            BeneficiaryStatus::Enrolled => self.enrolled += count,
            BeneficiaryStatus::Training => self.training += count,
            BeneficiaryStatus::Certified => self.certified += count,
            BeneficiaryStatus::Placed => self.placed += count,
            BeneficiaryStatus::Dropped => self.dropped += count,
        }
    }

    /// Training, certified, and placed learners together.
    #[must_use]
    pub const fn trained(&self) -> u64 {
        self.training + self.certified + self.placed
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Response from `POST /api/evidence/bundle/{programmeId}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvidenceRequested {
    pub bundle_id: String,
    pub status: EvidenceStatus,
    pub expires_at: DateTime<Utc>,
}

/// Response from `GET /api/evidence/download/{bundleId}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvidenceDownload {
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
    pub download_count: u32,
}

/// Response from `GET /api/exports/download/{jobId}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExportDownload {
    pub download_url: String,
    pub file_path: String,
    pub format: ExportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1, 10, 0, 0)]
    #[case(1, 10, 10, 1)]
    #[case(2, 10, 11, 2)]
    #[case(1, 20, 45, 3)]
    #[case(1, 0, 5, 0)]
    fn pagination_pages(
        #[case] current: u32,
        #[case] limit: u32,
        #[case] total: u64,
        #[case] pages: u32,
    ) {
        let p = Pagination::new(current, limit, total);
        assert_eq!(p.pages, pages);
        assert_eq!(p.total, total);
    }

    #[test]
    fn page_request_clamps() {
        let req = PageRequest::clamped(Some(0), Some(500), 20, 100);
        assert_eq!(req, PageRequest { page: 1, limit: 100 });
        let req = PageRequest::clamped(None, Some(0), 20, 100);
        assert_eq!(req.limit, 1);
        let req = PageRequest::clamped(None, None, 20, 100);
        assert_eq!(req.limit, 20);
    }

    #[test]
    fn page_request_offset() {
        assert_eq!(PageRequest { page: 3, limit: 10 }.offset(), 20);
        assert_eq!(PageRequest { page: 1, limit: 10 }.offset(), 0);
    }

    #[test]
    fn status_counts_trained() {
        let mut counts = StatusCounts::default();
        counts.add(BeneficiaryStatus::Enrolled, 4);
        counts.add(BeneficiaryStatus::Training, 3);
        counts.add(BeneficiaryStatus::Certified, 2);
        counts.add(BeneficiaryStatus::Placed, 1);
        assert_eq!(counts.trained(), 6);
    }

    #[test]
    fn import_row_error_shape() {
        let mut data = serde_json::Map::new();
        data.insert("cohort_code".into(), "C1".into());
        let err = ImportRowError {
            row: 3,
            error: "learner_id is required".into(),
            data,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"row": 3, "error": "learner_id is required", "data": {"cohort_code": "C1"}})
        );
    }
}
