//! Placement record repository.

use skt_core::audit_detail::PlacementDetail;
use skt_core::entities::PlacementRecord;
use skt_core::enums::{AuditAction, BeneficiaryStatus, ResourceType};
use skt_core::ids::PREFIX_PLACEMENT;
use skt_core::validation::NewPlacement;

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_ts, get_bool, get_opt_string, now, parse_datetime, parse_enum, parse_optional_datetime,
};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

const SELECT_COLS: &str = "id, beneficiary_id, job_id, employer_id, offer_date, join_date, ctc, \
     currency, location, retained_30d, retained_90d, status, created_at, updated_at";

fn row_to_placement(row: &libsql::Row) -> Result<PlacementRecord, DatabaseError> {
    Ok(PlacementRecord {
        id: row.get(0)?,
        beneficiary_id: row.get(1)?,
        job_id: get_opt_string(row, 2)?,
        employer_id: get_opt_string(row, 3)?,
        offer_date: parse_optional_datetime(get_opt_string(row, 4)?.as_deref())?,
        join_date: parse_optional_datetime(get_opt_string(row, 5)?.as_deref())?,
        ctc: row.get::<Option<f64>>(6)?,
        currency: row.get(7)?,
        location: get_opt_string(row, 8)?,
        retained_30d: get_bool(row, 9)?,
        retained_90d: get_bool(row, 10)?,
        status: parse_enum(&row.get::<String>(11)?)?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
        updated_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

impl SktService {
    /// Record a placement. The beneficiary moves to PLACED.
    pub async fn add_placement(
        &self,
        beneficiary_id: &str,
        new: NewPlacement,
        actor: &Actor,
    ) -> Result<PlacementRecord, DatabaseError> {
        let beneficiary = self.get_beneficiary_record(beneficiary_id).await?;

        let now = now();
        let id = self.db().generate_id(PREFIX_PLACEMENT).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO placement_records (id, beneficiary_id, job_id, employer_id, offer_date, join_date, ctc, currency, location, retained_30d, retained_90d, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                libsql::params![
                    id.as_str(),
                    beneficiary_id,
                    new.job_id.as_deref(),
                    new.employer_id.as_deref(),
                    new.offer_date.map(fmt_ts),
                    new.join_date.map(fmt_ts),
                    new.ctc,
                    new.currency.as_str(),
                    new.location.as_deref(),
                    i64::from(new.retained_30d),
                    i64::from(new.retained_90d),
                    new.status.as_str(),
                    fmt_ts(now),
                    fmt_ts(now)
                ],
            )
            .await?;

        self.set_beneficiary_status(beneficiary_id, BeneficiaryStatus::Placed)
            .await?;

        let placement = PlacementRecord {
            id: id.clone(),
            beneficiary_id: beneficiary_id.to_string(),
            job_id: new.job_id,
            employer_id: new.employer_id,
            offer_date: new.offer_date,
            join_date: new.join_date,
            ctc: new.ctc,
            currency: new.currency,
            location: new.location,
            retained_30d: new.retained_30d,
            retained_90d: new.retained_90d,
            status: new.status,
            created_at: now,
            updated_at: now,
        };

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(&beneficiary.programme_id),
                action: AuditAction::AddPlacement,
                resource_type: ResourceType::Placement,
                resource_id: Some(&id),
                meta: PlacementDetail {
                    status: placement.status,
                    employer_id: placement.employer_id.clone(),
                    ctc: placement.ctc,
                },
            },
        )
        .await?;

        Ok(placement)
    }

    /// Most recent placement of a beneficiary, if any.
    pub async fn latest_placement(
        &self,
        beneficiary_id: &str,
    ) -> Result<Option<PlacementRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM placement_records WHERE beneficiary_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                [beneficiary_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_placement(&row)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{create_test_programme, enrol, manager, test_service};
    use pretty_assertions::assert_eq;
    use skt_core::enums::PlacementStatus;
    use skt_core::validation::PlacementRequest;

    fn placement(ctc: f64) -> NewPlacement {
        PlacementRequest {
            employer_id: Some("EMP-3".into()),
            join_date: Some("2025-03-01".into()),
            ctc: Some(ctc),
            status: Some("JOINED".into()),
            ..PlacementRequest::default()
        }
        .validate()
        .unwrap()
        .0
    }

    #[tokio::test]
    async fn add_placement_marks_beneficiary_placed() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;

        let added = svc
            .add_placement(&beneficiary.id, placement(240_000.0), &manager())
            .await
            .unwrap();
        assert_eq!(added.status, PlacementStatus::Joined);
        assert_eq!(added.currency, "INR");

        let detail = svc.get_beneficiary(&beneficiary.id).await.unwrap();
        assert_eq!(detail.beneficiary.status, BeneficiaryStatus::Placed);
        assert_eq!(detail.placement_record, Some(added));
    }

    #[tokio::test]
    async fn latest_placement_wins() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;

        svc.add_placement(&beneficiary.id, placement(180_000.0), &manager())
            .await
            .unwrap();
        let second = svc
            .add_placement(&beneficiary.id, placement(300_000.0), &manager())
            .await
            .unwrap();

        let latest = svc.latest_placement(&beneficiary.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[tokio::test]
    async fn add_placement_is_audited() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;
        svc.add_placement(&beneficiary.id, placement(240_000.0), &manager())
            .await
            .unwrap();

        let events = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::AddPlacement),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].programme_id.as_deref(), Some(programme.id.as_str()));
        assert_eq!(
            events[0].meta,
            serde_json::json!({"status": "JOINED", "employer_id": "EMP-3", "ctc": 240000.0})
        );
    }

    #[tokio::test]
    async fn unknown_beneficiary() {
        let svc = test_service().await;
        let err = svc
            .add_placement("ben-missing", placement(1.0), &manager())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }
}
