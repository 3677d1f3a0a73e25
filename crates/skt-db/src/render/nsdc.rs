//! NSDC and PMKVY JSON exports.
//!
//! PMKVY is the NSDC document with a `scheme_info` header flattened in front.

use chrono::{DateTime, Utc};
use serde::Serialize;

use skt_core::enums::{BeneficiaryStatus, PlacementStatus, SponsorType, TargetMetric};

use super::{ExportData, ExportRow};

#[derive(Debug, Serialize)]
pub(super) struct NsdcExport<'a> {
    programme_info: ProgrammeInfo<'a>,
    targets: Vec<TargetEntry>,
    beneficiaries: Vec<BeneficiaryEntry<'a>>,
    generated_at: DateTime<Utc>,
    include_pii: bool,
}

#[derive(Debug, Serialize)]
struct ProgrammeInfo<'a> {
    code: &'a str,
    name: &'a str,
    sponsor_type: SponsorType,
    sectors: &'a [String],
    districts: &'a [String],
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct TargetEntry {
    metric: TargetMetric,
    target_value: f64,
}

#[derive(Debug, Serialize)]
struct BeneficiaryEntry<'a> {
    beneficiary_id: &'a str,
    status: BeneficiaryStatus,
    enrolled_date: DateTime<Utc>,
    training_progress: f64,
    skillscore: Option<f64>,
    placement: Option<PlacementEntry>,
    #[serde(flatten)]
    pii: Option<Pii<'a>>,
}

#[derive(Debug, Serialize)]
struct PlacementEntry {
    status: PlacementStatus,
    ctc: Option<f64>,
    join_date: Option<DateTime<Utc>>,
    retained_90d: bool,
}

#[derive(Debug, Serialize)]
struct Pii<'a> {
    learner_id: &'a str,
    institution_id: Option<&'a str>,
    cohort_code: Option<&'a str>,
}

impl<'a> NsdcExport<'a> {
    pub(super) fn new(data: &'a ExportData) -> Self {
        let p = &data.programme;
        Self {
            programme_info: ProgrammeInfo {
                code: &p.code,
                name: &p.name,
                sponsor_type: p.sponsor_type,
                sectors: &p.sectors,
                districts: &p.districts,
                start_date: p.start_date,
                end_date: p.end_date,
            },
            targets: data
                .targets
                .iter()
                .map(|t| TargetEntry {
                    metric: t.metric,
                    target_value: t.target_value,
                })
                .collect(),
            beneficiaries: data
                .rows
                .iter()
                .map(|row| BeneficiaryEntry::new(row, data.include_pii))
                .collect(),
            generated_at: data.generated_at,
            include_pii: data.include_pii,
        }
    }
}

impl<'a> BeneficiaryEntry<'a> {
    fn new(row: &'a ExportRow, include_pii: bool) -> Self {
        let b = &row.beneficiary;
        Self {
            beneficiary_id: &b.id,
            status: b.status,
            enrolled_date: b.enrolled_at,
            training_progress: row.progress.as_ref().map_or(0.0, |p| p.training_pct),
            skillscore: row.progress.as_ref().and_then(|p| p.last_skillscore),
            placement: row.placement.as_ref().map(|p| PlacementEntry {
                status: p.status,
                ctc: p.ctc,
                join_date: p.join_date,
                retained_90d: p.retained_90d,
            }),
            pii: include_pii.then(|| Pii {
                learner_id: &b.learner_id,
                institution_id: b.institution_id.as_deref(),
                cohort_code: b.cohort_code.as_deref(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PmkvyExport<'a> {
    scheme_info: SchemeInfo<'a>,
    #[serde(flatten)]
    body: NsdcExport<'a>,
}

#[derive(Debug, Serialize)]
struct SchemeInfo<'a> {
    scheme_name: &'static str,
    programme_code: &'a str,
    programme_name: &'a str,
    implementing_agency: &'static str,
}

impl<'a> PmkvyExport<'a> {
    pub(super) fn new(data: &'a ExportData) -> Self {
        let p = &data.programme;
        Self {
            scheme_info: SchemeInfo {
                scheme_name: "PMKVY",
                programme_code: &p.code,
                programme_name: &p.name,
                implementing_agency: match p.sponsor_type {
                    SponsorType::Gov => "Government",
                    SponsorType::Csr => "CSR Partner",
                },
            },
            body: NsdcExport::new(data),
        }
    }
}
