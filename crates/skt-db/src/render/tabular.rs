//! Flat CSV export: one row per beneficiary.

use csv::{Terminator, WriterBuilder};

use super::{ExportData, ExportRow, RenderError, day};

const NOT_AVAILABLE: &str = "N/A";

const HEADERS: [&str; 10] = [
    "Programme Code",
    "Programme Name",
    "Beneficiary ID",
    "Status",
    "Enrolled Date",
    "Training %",
    "Last SkillScore",
    "Placement Status",
    "CTC",
    "Join Date",
];

const PII_HEADERS: [&str; 3] = ["Learner ID", "Institution ID", "Cohort Code"];

/// PII columns go right after the programme name.
const PII_POSITION: usize = 2;

pub(super) fn render_csv(data: &ExportData) -> Result<Vec<u8>, RenderError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut headers: Vec<&str> = HEADERS.to_vec();
    if data.include_pii {
        headers.splice(PII_POSITION..PII_POSITION, PII_HEADERS);
    }
    writer.write_record(&headers)?;

    for row in &data.rows {
        writer.write_record(record(data, row))?;
    }

    writer
        .into_inner()
        .map_err(|e| RenderError::Buffer(e.to_string()))
}

fn record(data: &ExportData, row: &ExportRow) -> Vec<String> {
    let b = &row.beneficiary;
    let progress = row.progress.as_ref();
    let placement = row.placement.as_ref();

    let mut fields = vec![
        data.programme.code.clone(),
        data.programme.name.clone(),
        b.id.clone(),
        b.status.to_string(),
        day(b.enrolled_at),
        progress.map_or(0.0, |p| p.training_pct).to_string(),
        progress
            .and_then(|p| p.last_skillscore)
            .unwrap_or(0.0)
            .to_string(),
        placement.map_or_else(|| NOT_AVAILABLE.to_string(), |p| p.status.to_string()),
        placement.and_then(|p| p.ctc).unwrap_or(0.0).to_string(),
        placement
            .and_then(|p| p.join_date)
            .map_or_else(|| NOT_AVAILABLE.to_string(), day),
    ];
    if data.include_pii {
        let pii = [
            b.learner_id.clone(),
            b.institution_id.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            b.cohort_code.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ];
        fields.splice(PII_POSITION..PII_POSITION, pii);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;
    use pretty_assertions::assert_eq;
    use skt_core::enums::SponsorType;

    fn lines(data: &ExportData) -> Vec<String> {
        String::from_utf8(render_csv(data).unwrap())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn without_pii() {
        let lines = lines(&fixtures::data(SponsorType::Gov, false));
        assert_eq!(
            lines,
            vec![
                "Programme Code,Programme Name,Beneficiary ID,Status,Enrolled Date,Training %,Last SkillScore,Placement Status,CTC,Join Date",
                "PSD25,Pune Skilling Drive,ben-00000001,PLACED,2025-01-02,100,72.5,JOINED,240000,2025-03-01",
                "PSD25,Pune Skilling Drive,ben-00000002,ENROLLED,2025-01-02,0,0,N/A,0,N/A",
            ]
        );
    }

    #[test]
    fn pii_columns_follow_programme_name() {
        let lines = lines(&fixtures::data(SponsorType::Gov, true));
        assert!(lines[0].starts_with(
            "Programme Code,Programme Name,Learner ID,Institution ID,Cohort Code,Beneficiary ID,"
        ));
        assert!(lines[2].starts_with(
            "PSD25,Pune Skilling Drive,LEARNER002,ITI-PUNE,N/A,ben-00000002,"
        ));
    }

    #[test]
    fn quotes_fields_with_commas() {
        let mut data = fixtures::data(SponsorType::Csr, false);
        data.programme.name = "Skilling, Phase 2".into();
        data.rows.truncate(1);
        let lines = lines(&data);
        assert!(lines[1].starts_with("PSD25,\"Skilling, Phase 2\",ben-00000001,"));
    }
}
