//! Pure impact-dashboard math.
//!
//! Everything here is storage-agnostic: the database layer fetches counts and
//! raw columns, these helpers turn them into KPI figures.

use chrono::{DateTime, Duration, Utc};

use crate::enums::{BeneficiaryStatus, MilestoneType};

/// Reporting window for the impact dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardWindow {
    Week,
    Month,
    Quarter,
    Year,
}

impl DashboardWindow {
    /// Parse `7d`, `30d`, `90d` or `1y`. Anything else means 30 days.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("7d") => Self::Week,
            Some("90d") => Self::Quarter,
            Some("1y") => Self::Year,
            _ => Self::Month,
        }
    }

    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "1y",
        }
    }

    /// Start of the window ending at `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

/// Median of `values`. Sorts in place. `None` for an empty slice.
///
/// Even-length input averages the two middle values.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Percentage of target reached, rounded to a whole number. 0 without a target.
#[must_use]
pub fn target_percentage(value: u64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let value = value as f64;
    (value / target * 100.0).round()
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Beneficiary status implied by reaching a milestone, if any.
#[must_use]
pub const fn status_for_milestone(milestone: MilestoneType) -> Option<BeneficiaryStatus> {
    match milestone {
        MilestoneType::TrainingStarted => Some(BeneficiaryStatus::Training),
        MilestoneType::Certified => Some(BeneficiaryStatus::Certified),
        MilestoneType::Placed => Some(BeneficiaryStatus::Placed),
        MilestoneType::TrainingCompleted | MilestoneType::AssessmentPassed => None,
    }
}

/// District label used when a beneficiary has none.
pub const UNASSIGNED_DISTRICT: &str = "UNASSIGNED";

/// Statuses a trend metric counts. `None` counts every beneficiary.
#[must_use]
pub fn trend_statuses(metric: &str) -> Option<&'static [BeneficiaryStatus]> {
    match metric {
        "TRAINED" => Some(&[
            BeneficiaryStatus::Training,
            BeneficiaryStatus::Certified,
            BeneficiaryStatus::Placed,
        ]),
        "CERTIFIED" => Some(&[BeneficiaryStatus::Certified]),
        "PLACED" => Some(&[BeneficiaryStatus::Placed]),
        _ => None,
    }
}
