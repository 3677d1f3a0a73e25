//! Progress record repository: one record per beneficiary, milestones appended.

use skt_core::audit_detail::ProgressDetail;
use skt_core::entities::{Milestone, ProgressRecord};
use skt_core::enums::{AuditAction, ResourceType};
use skt_core::ids::PREFIX_PROGRESS;
use skt_core::impact::status_for_milestone;
use skt_core::validation::ProgressUpdate;

use crate::error::DatabaseError;
use crate::helpers::{fmt_ts, get_opt_string, now, parse_datetime, parse_json, to_json_text};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

const SELECT_COLS: &str =
    "id, beneficiary_id, training_pct, last_assessment_id, last_skillscore, last_updated, milestones";

fn row_to_progress(row: &libsql::Row) -> Result<ProgressRecord, DatabaseError> {
    Ok(ProgressRecord {
        id: row.get(0)?,
        beneficiary_id: row.get(1)?,
        training_pct: row.get(2)?,
        last_assessment_id: get_opt_string(row, 3)?,
        last_skillscore: row.get::<Option<f64>>(4)?,
        last_updated: parse_datetime(&row.get::<String>(5)?)?,
        milestones: parse_json(&row.get::<String>(6)?)?,
    })
}

impl SktService {
    /// Create the empty progress record every new beneficiary starts with.
    pub(crate) async fn insert_progress_record(
        &self,
        beneficiary_id: &str,
    ) -> Result<ProgressRecord, DatabaseError> {
        let now = now();
        let id = self.db().generate_id(PREFIX_PROGRESS).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO progress_records (id, beneficiary_id, training_pct, last_updated, milestones)
                 VALUES (?1, ?2, 0, ?3, '[]')",
                libsql::params![id.as_str(), beneficiary_id, fmt_ts(now)],
            )
            .await?;
        Ok(ProgressRecord {
            id,
            beneficiary_id: beneficiary_id.to_string(),
            training_pct: 0.0,
            last_assessment_id: None,
            last_skillscore: None,
            last_updated: now,
            milestones: Vec::new(),
        })
    }

    pub async fn get_progress(
        &self,
        beneficiary_id: &str,
    ) -> Result<Option<ProgressRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM progress_records WHERE beneficiary_id = ?1"),
                [beneficiary_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_progress(&row)?)),
            None => Ok(None),
        }
    }

    /// Upsert a beneficiary's progress. Absent fields keep their stored
    /// values; a milestone is appended with `achieved_at = now` and may move
    /// the beneficiary's status.
    pub async fn update_progress(
        &self,
        beneficiary_id: &str,
        update: ProgressUpdate,
        actor: &Actor,
    ) -> Result<ProgressRecord, DatabaseError> {
        let beneficiary = self.get_beneficiary_record(beneficiary_id).await?;
        let mut record = match self.get_progress(beneficiary_id).await? {
            Some(record) => record,
            None => self.insert_progress_record(beneficiary_id).await?,
        };

        let now = now();
        if let Some(pct) = update.training_pct {
            record.training_pct = pct;
        }
        if let Some(assessment) = update.last_assessment_id {
            record.last_assessment_id = Some(assessment);
        }
        if let Some(score) = update.last_skillscore {
            record.last_skillscore = Some(score);
        }
        let milestone_type = update.milestone.as_ref().map(|(kind, _)| *kind);
        if let Some((milestone_type, metadata)) = update.milestone {
            record.milestones.push(Milestone {
                milestone_type,
                achieved_at: now,
                metadata,
            });
        }
        record.last_updated = now;

        self.db()
            .conn()
            .execute(
                "UPDATE progress_records
                 SET training_pct = ?1, last_assessment_id = ?2, last_skillscore = ?3, last_updated = ?4, milestones = ?5
                 WHERE id = ?6",
                libsql::params![
                    record.training_pct,
                    record.last_assessment_id.as_deref(),
                    record.last_skillscore,
                    fmt_ts(now),
                    to_json_text(&record.milestones)?,
                    record.id.as_str()
                ],
            )
            .await?;

        if let Some(status) = milestone_type.and_then(status_for_milestone) {
            self.set_beneficiary_status(beneficiary_id, status).await?;
        }

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(&beneficiary.programme_id),
                action: AuditAction::UpdateProgress,
                resource_type: ResourceType::Progress,
                resource_id: Some(&record.id),
                meta: ProgressDetail {
                    training_pct: record.training_pct,
                    last_skillscore: record.last_skillscore,
                    milestone: milestone_type,
                },
            },
        )
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{create_test_programme, enrol, manager, test_service};
    use pretty_assertions::assert_eq;
    use skt_core::enums::{BeneficiaryStatus, MilestoneType};

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;

        svc.update_progress(
            &beneficiary.id,
            ProgressUpdate {
                training_pct: Some(40.0),
                last_skillscore: Some(55.5),
                ..ProgressUpdate::default()
            },
            &manager(),
        )
        .await
        .unwrap();
        let record = svc
            .update_progress(
                &beneficiary.id,
                ProgressUpdate {
                    last_assessment_id: Some("asm-2".into()),
                    ..ProgressUpdate::default()
                },
                &manager(),
            )
            .await
            .unwrap();

        assert_eq!(record.training_pct, 40.0);
        assert_eq!(record.last_skillscore, Some(55.5));
        assert_eq!(record.last_assessment_id.as_deref(), Some("asm-2"));
        assert_eq!(svc.get_progress(&beneficiary.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn milestone_appends_and_moves_status() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;

        for kind in [MilestoneType::TrainingStarted, MilestoneType::Certified] {
            svc.update_progress(
                &beneficiary.id,
                ProgressUpdate {
                    milestone: Some((kind, serde_json::json!({"by": "trainer"}))),
                    ..ProgressUpdate::default()
                },
                &manager(),
            )
            .await
            .unwrap();
        }

        let record = svc.get_progress(&beneficiary.id).await.unwrap().unwrap();
        assert_eq!(record.milestones.len(), 2);
        assert_eq!(record.milestones[1].milestone_type, MilestoneType::Certified);
        let stored = svc.get_beneficiary_record(&beneficiary.id).await.unwrap();
        assert_eq!(stored.status, BeneficiaryStatus::Certified);
    }

    #[tokio::test]
    async fn assessment_milestone_keeps_status() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;

        svc.update_progress(
            &beneficiary.id,
            ProgressUpdate {
                milestone: Some((MilestoneType::AssessmentPassed, serde_json::json!({}))),
                ..ProgressUpdate::default()
            },
            &manager(),
        )
        .await
        .unwrap();
        let stored = svc.get_beneficiary_record(&beneficiary.id).await.unwrap();
        assert_eq!(stored.status, BeneficiaryStatus::Enrolled);
    }

    #[tokio::test]
    async fn recreates_missing_record() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;
        svc.db()
            .conn()
            .execute("DELETE FROM progress_records", ())
            .await
            .unwrap();

        let record = svc
            .update_progress(
                &beneficiary.id,
                ProgressUpdate {
                    training_pct: Some(10.0),
                    ..ProgressUpdate::default()
                },
                &manager(),
            )
            .await
            .unwrap();
        assert_eq!(record.training_pct, 10.0);
    }

    #[tokio::test]
    async fn unknown_beneficiary() {
        let svc = test_service().await;
        let err = svc
            .update_progress("ben-missing", ProgressUpdate::default(), &manager())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Beneficiary not found");
    }
}
