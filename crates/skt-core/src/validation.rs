//! Request payloads and their validation rules.
//!
//! Request structs deserialize loosely (enums arrive as plain strings, every
//! field is optional) so that `validate()` can report the first violation with
//! a readable message such as `"name" length must be at least 3 characters long`.
//! A successful `validate()` yields the typed `New*` value the storage layer
//! accepts.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::ExportFilters;
use crate::enums::{
    BeneficiaryStatus, EvidenceType, ExportDestination, ExportFormat, ExportSchedule,
    FundingRuleType, MilestoneType, PlacementStatus, ProgrammeStatus, SponsorType, TargetMetric,
    UnknownVariant,
};
use crate::errors::CoreError;

pub const DEFAULT_CURRENCY: &str = "INR";

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

/// Require a field to be present.
pub fn required<T>(field: &str, value: Option<T>) -> Result<T, CoreError> {
    value.ok_or_else(|| CoreError::validation(format!("\"{field}\" is required")))
}

/// Require a non-blank string. Surrounding whitespace is trimmed.
pub fn required_str(field: &str, value: Option<String>) -> Result<String, CoreError> {
    let value = required(field, value)?;
    non_empty(field, &value)
}

fn non_empty(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!(
            "\"{field}\" is not allowed to be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional string, mapping blank input to `None`.
#[must_use]
pub fn optional_str(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Check a string's length in characters.
pub fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len < min {
        return Err(CoreError::validation(format!(
            "\"{field}\" length must be at least {min} characters long"
        )));
    }
    if len > max {
        return Err(CoreError::validation(format!(
            "\"{field}\" length must be less than or equal to {max} characters long"
        )));
    }
    Ok(())
}

/// Check a number is finite and within `[min, max]`.
pub fn check_range(field: &str, value: f64, min: f64, max: Option<f64>) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::validation(format!("\"{field}\" must be a number")));
    }
    if value < min {
        return Err(CoreError::validation(format!(
            "\"{field}\" must be greater than or equal to {min}"
        )));
    }
    match max {
        Some(max) if value > max => Err(CoreError::validation(format!(
            "\"{field}\" must be less than or equal to {max}"
        ))),
        _ => Ok(()),
    }
}

/// Parse a wire enum name, reporting the allowed values on failure.
pub fn parse_enum_field<T>(field: &str, value: &str) -> Result<T, CoreError>
where
    T: FromStr<Err = UnknownVariant>,
{
    value.parse::<T>().map_err(|e| {
        CoreError::validation(format!(
            "\"{field}\" must be one of [{}]",
            e.expected.join(", ")
        ))
    })
}

/// Parse a date given as RFC 3339 or as a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, CoreError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::validation(format!("\"{field}\" must be a valid date")))
}

fn parse_optional_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, CoreError> {
    value.map(|v| parse_date(field, v)).transpose()
}

/// Require a JSON object, defaulting to `{}` when absent.
pub fn object_or_empty(
    field: &str,
    value: Option<serde_json::Value>,
) -> Result<serde_json::Value, CoreError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(serde_json::json!({})),
        Some(v @ serde_json::Value::Object(_)) => Ok(v),
        Some(_) => Err(CoreError::validation(format!(
            "\"{field}\" must be of type object"
        ))),
    }
}

fn check_date_order(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), CoreError> {
    if end < start {
        return Err(CoreError::validation(
            "\"end_date\" must be greater than or equal to \"ref:start_date\"",
        ));
    }
    Ok(())
}

fn clean_list(field: &str, values: Vec<String>) -> Result<Vec<String>, CoreError> {
    let cleaned: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if cleaned.is_empty() {
        return Err(CoreError::validation(format!(
            "\"{field}\" must contain at least 1 items"
        )));
    }
    Ok(cleaned)
}

// ---------------------------------------------------------------------------
// Programme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgrammeRequest {
    pub sponsor_type: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sectors: Option<Vec<String>>,
    pub districts: Option<Vec<String>>,
    pub created_by: Option<String>,
    pub status: Option<String>,
}

/// A validated programme, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgramme {
    pub sponsor_type: SponsorType,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub sectors: Vec<String>,
    pub districts: Vec<String>,
    pub created_by: String,
    pub status: ProgrammeStatus,
}

impl ProgrammeRequest {
    pub fn validate(self) -> Result<NewProgramme, CoreError> {
        let sponsor_type = required_str("sponsor_type", self.sponsor_type)?;
        let sponsor_type = parse_enum_field("sponsor_type", &sponsor_type)?;

        let name = required_str("name", self.name)?;
        check_len("name", &name, 3, 200)?;

        let code = required_str("code", self.code)?;
        check_len("code", &code, 2, 20)?;

        let description = optional_str(self.description);
        if let Some(description) = &description {
            check_len("description", description, 0, 1000)?;
        }

        let start_date = parse_date("start_date", &required("start_date", self.start_date)?)?;
        let end_date = parse_date("end_date", &required("end_date", self.end_date)?)?;
        check_date_order(start_date, end_date)?;

        let sectors = clean_list("sectors", required("sectors", self.sectors)?)?;
        let districts = clean_list("districts", required("districts", self.districts)?)?;
        let created_by = required_str("created_by", self.created_by)?;

        let status = match self.status {
            Some(s) => parse_enum_field("status", &s)?,
            None => ProgrammeStatus::Draft,
        };

        Ok(NewProgramme {
            sponsor_type,
            name,
            code,
            description,
            start_date,
            end_date,
            sectors,
            districts,
            created_by,
            status,
        })
    }
}

/// Partial programme update. Every field is optional; present fields follow
/// the same rules as [`ProgrammeRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgrammeUpdateRequest {
    pub sponsor_type: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sectors: Option<Vec<String>>,
    pub districts: Option<Vec<String>>,
    pub status: Option<String>,
    pub updated_by: Option<String>,
}

/// Typed fields of a validated [`ProgrammeUpdateRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgrammeChanges {
    pub sponsor_type: Option<SponsorType>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sectors: Option<Vec<String>>,
    pub districts: Option<Vec<String>>,
    pub status: Option<ProgrammeStatus>,
}

impl ProgrammeUpdateRequest {
    /// Validate present fields. Date ordering against the stored record is
    /// checked by the storage layer.
    pub fn validate(self) -> Result<(ProgrammeChanges, Option<String>), CoreError> {
        let sponsor_type = self
            .sponsor_type
            .map(|s| parse_enum_field("sponsor_type", &s))
            .transpose()?;
        let name = self.name.map(|n| non_empty("name", &n)).transpose()?;
        if let Some(name) = &name {
            check_len("name", name, 3, 200)?;
        }
        let code = self.code.map(|c| non_empty("code", &c)).transpose()?;
        if let Some(code) = &code {
            check_len("code", code, 2, 20)?;
        }
        let description = self.description.map(|d| d.trim().to_string());
        if let Some(description) = &description {
            check_len("description", description, 0, 1000)?;
        }
        let start_date = parse_optional_date("start_date", self.start_date.as_deref())?;
        let end_date = parse_optional_date("end_date", self.end_date.as_deref())?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            check_date_order(start, end)?;
        }
        let sectors = self
            .sectors
            .map(|s| clean_list("sectors", s))
            .transpose()?;
        let districts = self
            .districts
            .map(|d| clean_list("districts", d))
            .transpose()?;
        let status = self
            .status
            .map(|s| parse_enum_field("status", &s))
            .transpose()?;

        Ok((
            ProgrammeChanges {
                sponsor_type,
                name,
                code,
                description,
                start_date,
                end_date,
                sectors,
                districts,
                status,
            },
            optional_str(self.updated_by),
        ))
    }
}

/// Check the ordering rule for a date pair that may mix stored and new values.
pub fn check_programme_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), CoreError> {
    check_date_order(start, end)
}

// ---------------------------------------------------------------------------
// Targets and funding rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetRequest {
    pub metric: Option<String>,
    pub target_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTarget {
    pub metric: TargetMetric,
    pub target_value: f64,
}

impl TargetRequest {
    pub fn validate(self) -> Result<NewTarget, CoreError> {
        let metric = parse_enum_field("metric", &required_str("metric", self.metric)?)?;
        let target_value = required("target_value", self.target_value)?;
        check_range("target_value", target_value, 0.0, None)?;
        Ok(NewTarget {
            metric,
            target_value,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundingRuleRequest {
    pub rule_type: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub conditions: Option<serde_json::Value>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFundingRule {
    pub rule_type: FundingRuleType,
    pub amount: f64,
    pub currency: String,
    pub conditions: serde_json::Value,
    pub active: bool,
}

impl FundingRuleRequest {
    pub fn validate(self) -> Result<NewFundingRule, CoreError> {
        let rule_type = parse_enum_field("rule_type", &required_str("rule_type", self.rule_type)?)?;
        let amount = required("amount", self.amount)?;
        check_range("amount", amount, 0.0, None)?;
        Ok(NewFundingRule {
            rule_type,
            amount,
            currency: optional_str(self.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            conditions: object_or_empty("conditions", self.conditions)?,
            active: self.active.unwrap_or(true),
        })
    }
}

// ---------------------------------------------------------------------------
// Beneficiaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeneficiaryRequest {
    pub learner_id: Option<String>,
    pub programme_id: Option<String>,
    pub institution_id: Option<String>,
    pub cohort_code: Option<String>,
    pub district: Option<String>,
    pub enrolled_at: Option<String>,
    pub eligibility: Option<serde_json::Value>,
    pub created_by: Option<String>,
}

/// A validated beneficiary. `programme_id` is passed separately so the same
/// value can come from a request body or a CSV import.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBeneficiary {
    pub learner_id: String,
    pub institution_id: Option<String>,
    pub cohort_code: Option<String>,
    pub district: Option<String>,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub eligibility: serde_json::Value,
    pub status: BeneficiaryStatus,
}

impl NewBeneficiary {
    /// A freshly enrolled learner with no optional fields.
    pub fn enrolled(learner_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            institution_id: None,
            cohort_code: None,
            district: None,
            enrolled_at: None,
            eligibility: serde_json::json!({}),
            status: BeneficiaryStatus::Enrolled,
        }
    }
}

impl BeneficiaryRequest {
    /// Returns the programme id, the validated beneficiary, and the actor.
    pub fn validate(self) -> Result<(String, NewBeneficiary, Option<String>), CoreError> {
        let learner_id = required_str("learner_id", self.learner_id)?;
        let programme_id = required_str("programme_id", self.programme_id)?;
        Ok((
            programme_id,
            NewBeneficiary {
                learner_id,
                institution_id: optional_str(self.institution_id),
                cohort_code: optional_str(self.cohort_code),
                district: optional_str(self.district),
                enrolled_at: parse_optional_date("enrolled_at", self.enrolled_at.as_deref())?,
                eligibility: object_or_empty("eligibility", self.eligibility)?,
                status: BeneficiaryStatus::Enrolled,
            },
            optional_str(self.created_by),
        ))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    pub status: Option<String>,
    pub updated_by: Option<String>,
}

impl StatusChangeRequest {
    pub fn validate(self) -> Result<(BeneficiaryStatus, Option<String>), CoreError> {
        let status = parse_enum_field("status", &required_str("status", self.status)?)?;
        Ok((status, optional_str(self.updated_by)))
    }
}

// ---------------------------------------------------------------------------
// Progress and placement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneRequest {
    #[serde(rename = "type")]
    pub milestone_type: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub training_pct: Option<f64>,
    pub last_assessment_id: Option<String>,
    pub last_skillscore: Option<f64>,
    pub milestone: Option<MilestoneRequest>,
    pub updated_by: Option<String>,
}

/// A validated progress update. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub training_pct: Option<f64>,
    pub last_assessment_id: Option<String>,
    pub last_skillscore: Option<f64>,
    pub milestone: Option<(MilestoneType, serde_json::Value)>,
}

impl ProgressRequest {
    pub fn validate(self) -> Result<(ProgressUpdate, Option<String>), CoreError> {
        if let Some(pct) = self.training_pct {
            check_range("training_pct", pct, 0.0, Some(100.0))?;
        }
        if let Some(score) = self.last_skillscore {
            check_range("last_skillscore", score, 0.0, Some(100.0))?;
        }
        let milestone = match self.milestone {
            Some(m) => {
                let kind = required_str("milestone.type", m.milestone_type)?;
                let kind = parse_enum_field("milestone.type", &kind)?;
                Some((kind, object_or_empty("milestone.metadata", m.metadata)?))
            }
            None => None,
        };
        Ok((
            ProgressUpdate {
                training_pct: self.training_pct,
                last_assessment_id: optional_str(self.last_assessment_id),
                last_skillscore: self.last_skillscore,
                milestone,
            },
            optional_str(self.updated_by),
        ))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub job_id: Option<String>,
    pub employer_id: Option<String>,
    pub offer_date: Option<String>,
    pub join_date: Option<String>,
    pub ctc: Option<f64>,
    pub currency: Option<String>,
    pub location: Option<String>,
    pub retained_30d: Option<bool>,
    pub retained_90d: Option<bool>,
    pub status: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlacement {
    pub job_id: Option<String>,
    pub employer_id: Option<String>,
    pub offer_date: Option<DateTime<Utc>>,
    pub join_date: Option<DateTime<Utc>>,
    pub ctc: Option<f64>,
    pub currency: String,
    pub location: Option<String>,
    pub retained_30d: bool,
    pub retained_90d: bool,
    pub status: PlacementStatus,
}

impl PlacementRequest {
    pub fn validate(self) -> Result<(NewPlacement, Option<String>), CoreError> {
        if let Some(ctc) = self.ctc {
            check_range("ctc", ctc, 0.0, None)?;
        }
        let status = match self.status {
            Some(s) => parse_enum_field("status", &s)?,
            None => PlacementStatus::Offered,
        };
        Ok((
            NewPlacement {
                job_id: optional_str(self.job_id),
                employer_id: optional_str(self.employer_id),
                offer_date: parse_optional_date("offer_date", self.offer_date.as_deref())?,
                join_date: parse_optional_date("join_date", self.join_date.as_deref())?,
                ctc: self.ctc,
                currency: optional_str(self.currency)
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                location: optional_str(self.location),
                retained_30d: self.retained_30d.unwrap_or(false),
                retained_90d: self.retained_90d.unwrap_or(false),
                status,
            },
            optional_str(self.created_by),
        ))
    }
}

// ---------------------------------------------------------------------------
// Evidence and exports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceRequest {
    #[serde(rename = "type")]
    pub bundle_type: Option<String>,
    pub beneficiary_id: Option<String>,
    pub requested_by: Option<String>,
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvidenceBundle {
    pub bundle_type: EvidenceType,
    pub beneficiary_id: Option<String>,
    pub requested_by: String,
    pub expires_in_days: u32,
}

impl EvidenceRequest {
    /// `default_expiry_days` applies when the request omits `expires_in_days`.
    pub fn validate(self, default_expiry_days: u32) -> Result<NewEvidenceBundle, CoreError> {
        let bundle_type = match self.bundle_type {
            Some(t) => parse_enum_field("type", &t)?,
            None => EvidenceType::Full,
        };
        let requested_by = required_str("requested_by", self.requested_by)?;
        let expires_in_days = match self.expires_in_days {
            Some(days) if !(1..=365).contains(&days) => {
                return Err(CoreError::validation(
                    "\"expires_in_days\" must be between 1 and 365",
                ));
            }
            Some(days) => u32::try_from(days).unwrap_or(default_expiry_days),
            None => default_expiry_days,
        };
        Ok(NewEvidenceBundle {
            bundle_type,
            beneficiary_id: optional_str(self.beneficiary_id),
            requested_by,
            expires_in_days,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportFiltersRequest {
    pub status: Option<String>,
    pub district: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    pub format: Option<String>,
    pub destination: Option<String>,
    pub filters: Option<ExportFiltersRequest>,
    pub include_pii: Option<bool>,
    pub schedule: Option<String>,
    pub requested_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExportJob {
    pub format: ExportFormat,
    pub destination: ExportDestination,
    pub filters: ExportFilters,
    pub include_pii: bool,
    pub schedule: ExportSchedule,
    pub requested_by: String,
}

impl ExportRequest {
    pub fn validate(self) -> Result<NewExportJob, CoreError> {
        let format = parse_enum_field("format", &required_str("format", self.format)?)?;
        let destination =
            parse_enum_field("destination", &required_str("destination", self.destination)?)?;
        let requested_by = required_str("requested_by", self.requested_by)?;
        let schedule = match self.schedule {
            Some(s) => parse_enum_field("schedule", &s)?,
            None => ExportSchedule::Now,
        };
        let filters = match self.filters {
            Some(f) => ExportFilters {
                status: f
                    .status
                    .map(|s| parse_enum_field("filters.status", &s))
                    .transpose()?,
                district: optional_str(f.district),
                institution: optional_str(f.institution),
            },
            None => ExportFilters::default(),
        };
        Ok(NewExportJob {
            format,
            destination,
            filters,
            include_pii: self.include_pii.unwrap_or(false),
            schedule,
            requested_by,
        })
    }
}
