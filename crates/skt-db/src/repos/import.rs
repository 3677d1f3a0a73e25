//! CSV beneficiary import.
//!
//! The first row is the header. Recognised columns are `learner_id`
//! (required), `institution_id`, `cohort_code`, `district`, `enrolled_at`,
//! and `eligibility` (a JSON object). Unknown columns are ignored. Each row is
//! inserted on its own, so one bad row never blocks the rest.

use serde_json::{Map, Value};

use skt_core::audit_detail::BulkImportDetail;
use skt_core::enums::{AuditAction, ResourceType};
use skt_core::responses::{ImportReport, ImportRowError};
use skt_core::validation::{NewBeneficiary, optional_str, parse_date};

use crate::error::DatabaseError;
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

/// One data row as parsed from the file.
struct CsvRow {
    number: u64,
    fields: Map<String, Value>,
    /// Set when the row could not be decoded at all.
    decode_error: Option<String>,
}

impl CsvRow {
    fn field(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .and_then(|s| optional_str(Some(s.to_string())))
    }
}

fn read_rows(bytes: &[u8]) -> Result<Vec<CsvRow>, DatabaseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| DatabaseError::Validation(format!("Invalid CSV header: {e}")))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(DatabaseError::Validation("CSV file has no header row".into()));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let number = idx as u64 + 1;
        match record {
            Ok(record) => {
                let fields = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
                    .collect();
                rows.push(CsvRow {
                    number,
                    fields,
                    decode_error: None,
                });
            }
            Err(e) => rows.push(CsvRow {
                number,
                fields: Map::new(),
                decode_error: Some(format!("Unreadable row: {e}")),
            }),
        }
    }
    Ok(rows)
}

fn row_to_new_beneficiary(row: &CsvRow) -> Result<NewBeneficiary, String> {
    if let Some(ref err) = row.decode_error {
        return Err(err.clone());
    }
    let learner_id = row
        .field("learner_id")
        .ok_or_else(|| "learner_id is required".to_string())?;

    let eligibility = match row.field("eligibility") {
        None => serde_json::json!({}),
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(v @ Value::Object(_)) => v,
            Ok(_) => return Err("eligibility must be a JSON object".to_string()),
            Err(e) => return Err(format!("Invalid eligibility JSON: {e}")),
        },
    };
    let enrolled_at = row
        .field("enrolled_at")
        .map(|raw| parse_date("enrolled_at", &raw))
        .transpose()
        .map_err(|e| e.to_string())?;

    Ok(NewBeneficiary {
        institution_id: row.field("institution_id"),
        cohort_code: row.field("cohort_code"),
        district: row.field("district"),
        enrolled_at,
        eligibility,
        ..NewBeneficiary::enrolled(learner_id)
    })
}

impl SktService {
    /// Import beneficiaries from CSV bytes into a programme.
    ///
    /// Row-level problems (missing `learner_id`, bad eligibility JSON,
    /// duplicates) are reported in the returned [`ImportReport`]; only a
    /// missing programme, an unreadable header, or a storage failure aborts
    /// the import.
    pub async fn import_beneficiaries_csv(
        &self,
        programme_id: &str,
        bytes: &[u8],
        filename: &str,
        actor: &Actor,
    ) -> Result<ImportReport, DatabaseError> {
        self.get_programme(programme_id).await?;
        let rows = read_rows(bytes)?;

        let mut report = ImportReport {
            total: rows.len() as u64,
            ..ImportReport::default()
        };

        for row in rows {
            let outcome = match row_to_new_beneficiary(&row) {
                Ok(new) => match self.insert_beneficiary(programme_id, &new).await {
                    Ok(_) => Ok(()),
                    Err(DatabaseError::Validation(message)) => Err(message),
                    Err(e) => return Err(e),
                },
                Err(message) => Err(message),
            };
            match outcome {
                Ok(()) => report.successful += 1,
                Err(error) => {
                    report.failed += 1;
                    report.errors.push(ImportRowError {
                        row: row.number,
                        error,
                        data: row.fields,
                    });
                }
            }
        }

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::BulkImportBeneficiaries,
                resource_type: ResourceType::Beneficiary,
                resource_id: None,
                meta: BulkImportDetail {
                    total_rows: report.total,
                    successful: report.successful,
                    failed: report.failed,
                    filename: filename.to_string(),
                },
            },
        )
        .await?;

        tracing::info!(
            programme = %programme_id,
            total = report.total,
            successful = report.successful,
            failed = report.failed,
            "beneficiary import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::repos::beneficiary::{BeneficiaryFilter, DUPLICATE_LEARNER};
    use crate::test_support::helpers::{create_test_programme, enrol, manager, test_service};
    use pretty_assertions::assert_eq;
    use skt_core::responses::PageRequest;

    const CSV: &str = "learner_id,institution_id,cohort_code,district,eligibility\n\
        L001,ITI-PUNE,C1,Pune,\"{\"\"bpl\"\": true}\"\n\
        ,ITI-PUNE,C1,Pune,\n\
        L003,,C2,Mumbai,\n\
        L004,ITI-NASIK,C2,Nashik,not-json\n";

    #[tokio::test]
    async fn imports_valid_rows_and_reports_the_rest() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;

        let report = svc
            .import_beneficiaries_csv(&programme.id, CSV.as_bytes(), "learners.csv", &manager())
            .await
            .unwrap();

        assert_eq!(report.total, 4);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(report.errors[0].error, "learner_id is required");
        assert_eq!(report.errors[0].data["institution_id"], "ITI-PUNE");
        assert_eq!(report.errors[1].row, 4);
        assert!(report.errors[1].error.starts_with("Invalid eligibility JSON"));

        let page = svc
            .list_beneficiaries(
                &programme.id,
                &BeneficiaryFilter::default(),
                PageRequest { page: 1, limit: 10 },
            )
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
        let first = page
            .items
            .iter()
            .find(|d| d.beneficiary.learner_id == "L001")
            .unwrap();
        assert_eq!(first.beneficiary.eligibility, serde_json::json!({"bpl": true}));
        assert_eq!(first.beneficiary.district.as_deref(), Some("Pune"));
        assert!(first.progress_record.is_some());
    }

    #[tokio::test]
    async fn duplicates_are_row_errors() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        enrol(&svc, &programme.id, "L001").await;

        let report = svc
            .import_beneficiaries_csv(
                &programme.id,
                b"learner_id\nL001\nL002\nL002\n",
                "dupes.csv",
                &manager(),
            )
            .await
            .unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 2);
        assert!(report.errors.iter().all(|e| e.error == DUPLICATE_LEARNER));
        assert_eq!(report.errors[1].row, 3);
    }

    #[tokio::test]
    async fn import_is_audited_once() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        svc.import_beneficiaries_csv(&programme.id, b"learner_id\nA\nB\n", "two.csv", &manager())
            .await
            .unwrap();

        let events = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::BulkImportBeneficiaries),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].resource_id, None);
        assert_eq!(
            events[0].meta,
            serde_json::json!({"total_rows": 2, "successful": 2, "failed": 0, "filename": "two.csv"})
        );
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let err = svc
            .import_beneficiaries_csv(&programme.id, b"", "empty.csv", &manager())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_programme() {
        let svc = test_service().await;
        let err = svc
            .import_beneficiaries_csv("prg-missing", b"learner_id\nA\n", "a.csv", &manager())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn enrolled_at_column_is_parsed() {
        let rows = read_rows(b"learner_id,enrolled_at\nL1,2025-01-04\nL2,someday\n").unwrap();
        let ok = row_to_new_beneficiary(&rows[0]).unwrap();
        assert_eq!(
            ok.enrolled_at.map(|d| d.date_naive().to_string()).as_deref(),
            Some("2025-01-04")
        );
        let err = row_to_new_beneficiary(&rows[1]).unwrap_err();
        assert_eq!(err, "\"enrolled_at\" must be a valid date");
    }
}
