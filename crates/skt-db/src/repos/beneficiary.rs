//! Beneficiary repository: enrolment, listing with search, status changes.

use skt_core::audit_detail::{BeneficiaryAddedDetail, StatusChangedDetail};
use skt_core::entities::Beneficiary;
use skt_core::enums::{AuditAction, BeneficiaryStatus, ResourceType};
use skt_core::ids::PREFIX_BENEFICIARY;
use skt_core::responses::{BeneficiaryDetail, Page, PageRequest, Pagination};
use skt_core::validation::NewBeneficiary;

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_ts, get_opt_string, get_u64, is_unique_violation, now, parse_datetime, parse_enum,
    parse_json, sql_int, to_json_text,
};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

pub(crate) const SELECT_COLS: &str = "id, learner_id, programme_id, institution_id, cohort_code, \
     district, enrolled_at, eligibility, status, created_at, updated_at";

pub(crate) fn row_to_beneficiary(row: &libsql::Row) -> Result<Beneficiary, DatabaseError> {
    Ok(Beneficiary {
        id: row.get(0)?,
        learner_id: row.get(1)?,
        programme_id: row.get(2)?,
        institution_id: get_opt_string(row, 3)?,
        cohort_code: get_opt_string(row, 4)?,
        district: get_opt_string(row, 5)?,
        enrolled_at: parse_datetime(&row.get::<String>(6)?)?,
        eligibility: parse_json(&row.get::<String>(7)?)?,
        status: parse_enum(&row.get::<String>(8)?)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        updated_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

/// Message for a learner enrolled twice in one programme.
pub const DUPLICATE_LEARNER: &str = "Duplicate learner_id for this programme";

/// Filter criteria for beneficiary listings within a programme.
#[derive(Debug, Default, Clone)]
pub struct BeneficiaryFilter {
    pub status: Option<BeneficiaryStatus>,
    /// Case-insensitive substring of `learner_id` or `cohort_code`.
    pub q: Option<String>,
}

impl SktService {
    /// Enrol a learner. The programme must exist; the learner gets an empty
    /// progress record.
    pub async fn create_beneficiary(
        &self,
        programme_id: &str,
        new: NewBeneficiary,
        actor: &Actor,
    ) -> Result<Beneficiary, DatabaseError> {
        self.get_programme(programme_id).await?;
        let beneficiary = self.insert_beneficiary(programme_id, &new).await?;

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::AddBeneficiary,
                resource_type: ResourceType::Beneficiary,
                resource_id: Some(&beneficiary.id),
                meta: BeneficiaryAddedDetail {
                    learner_id: beneficiary.learner_id.clone(),
                },
            },
        )
        .await?;

        Ok(beneficiary)
    }

    /// Insert a beneficiary and its initial progress record without auditing.
    /// Shared by single enrolment and CSV import.
    pub(crate) async fn insert_beneficiary(
        &self,
        programme_id: &str,
        new: &NewBeneficiary,
    ) -> Result<Beneficiary, DatabaseError> {
        let now = now();
        let enrolled_at = new.enrolled_at.unwrap_or(now);
        let id = self.db().generate_id(PREFIX_BENEFICIARY).await?;

        let result = self
            .db()
            .conn()
            .execute(
                "INSERT INTO beneficiaries (id, learner_id, programme_id, institution_id, cohort_code, district, enrolled_at, eligibility, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                libsql::params![
                    id.as_str(),
                    new.learner_id.as_str(),
                    programme_id,
                    new.institution_id.as_deref(),
                    new.cohort_code.as_deref(),
                    new.district.as_deref(),
                    fmt_ts(enrolled_at),
                    to_json_text(&new.eligibility)?,
                    new.status.as_str(),
                    fmt_ts(now),
                    fmt_ts(now)
                ],
            )
            .await;
        match result {
            Err(e) if is_unique_violation(&e) => {
                return Err(DatabaseError::Validation(DUPLICATE_LEARNER.to_string()));
            }
            other => {
                other?;
            }
        }

        self.insert_progress_record(&id).await?;

        Ok(Beneficiary {
            id,
            learner_id: new.learner_id.clone(),
            programme_id: programme_id.to_string(),
            institution_id: new.institution_id.clone(),
            cohort_code: new.cohort_code.clone(),
            district: new.district.clone(),
            enrolled_at,
            eligibility: new.eligibility.clone(),
            status: new.status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch the bare beneficiary row, or `NotFound("Beneficiary not found")`.
    pub async fn get_beneficiary_record(&self, id: &str) -> Result<Beneficiary, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM beneficiaries WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Beneficiary"))?;
        row_to_beneficiary(&row)
    }

    /// A beneficiary with its progress record and latest placement.
    pub async fn get_beneficiary(&self, id: &str) -> Result<BeneficiaryDetail, DatabaseError> {
        let beneficiary = self.get_beneficiary_record(id).await?;
        self.beneficiary_detail(beneficiary).await
    }

    async fn beneficiary_detail(
        &self,
        beneficiary: Beneficiary,
    ) -> Result<BeneficiaryDetail, DatabaseError> {
        let progress_record = self.get_progress(&beneficiary.id).await?;
        let placement_record = self.latest_placement(&beneficiary.id).await?;
        Ok(BeneficiaryDetail {
            beneficiary,
            progress_record,
            placement_record,
        })
    }

    /// Beneficiaries of a programme, most recently enrolled first.
    pub async fn list_beneficiaries(
        &self,
        programme_id: &str,
        filter: &BeneficiaryFilter,
        page: PageRequest,
    ) -> Result<Page<BeneficiaryDetail>, DatabaseError> {
        let mut conditions = vec!["programme_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![programme_id.into()];

        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params.push(q.to_ascii_lowercase().into());
            let idx = params.len();
            conditions.push(format!(
                "(instr(lower(learner_id), ?{idx}) > 0 OR instr(lower(coalesce(cohort_code, '')), ?{idx}) > 0)"
            ));
        }
        let where_clause = conditions.join(" AND ");

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM beneficiaries WHERE {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = match rows.next().await? {
            Some(row) => get_u64(&row, 0)?,
            None => 0,
        };

        let sql = format!(
            "SELECT {SELECT_COLS} FROM beneficiaries WHERE {where_clause}
             ORDER BY enrolled_at DESC, rowid DESC LIMIT {} OFFSET {}",
            page.limit,
            sql_int(page.offset())
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut beneficiaries = Vec::new();
        while let Some(row) = rows.next().await? {
            beneficiaries.push(row_to_beneficiary(&row)?);
        }

        let mut items = Vec::with_capacity(beneficiaries.len());
        for beneficiary in beneficiaries {
            items.push(self.beneficiary_detail(beneficiary).await?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    /// Every beneficiary of a programme in enrolment order, optionally
    /// narrowed to one status, district, or institution.
    pub async fn programme_beneficiaries(
        &self,
        programme_id: &str,
        scope: &BeneficiaryScope,
    ) -> Result<Vec<Beneficiary>, DatabaseError> {
        let mut params: Vec<libsql::Value> = vec![programme_id.into()];
        let scope_clause = scope.and_clause("", &mut params);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM beneficiaries WHERE programme_id = ?1{scope_clause}
                     ORDER BY enrolled_at ASC, rowid ASC"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut beneficiaries = Vec::new();
        while let Some(row) = rows.next().await? {
            beneficiaries.push(row_to_beneficiary(&row)?);
        }
        Ok(beneficiaries)
    }

    /// Set a beneficiary's status. Any status may follow any other.
    pub async fn update_beneficiary_status(
        &self,
        id: &str,
        status: BeneficiaryStatus,
        actor: &Actor,
    ) -> Result<Beneficiary, DatabaseError> {
        let current = self.get_beneficiary_record(id).await?;
        self.set_beneficiary_status(id, status).await?;

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(&current.programme_id),
                action: AuditAction::UpdateBeneficiaryStatus,
                resource_type: ResourceType::Beneficiary,
                resource_id: Some(id),
                meta: StatusChangedDetail {
                    old_status: current.status,
                    new_status: status,
                },
            },
        )
        .await?;

        self.get_beneficiary_record(id).await
    }

    pub(crate) async fn set_beneficiary_status(
        &self,
        id: &str,
        status: BeneficiaryStatus,
    ) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE beneficiaries SET status = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![status.as_str(), fmt_ts(now()), id],
            )
            .await?;
        Ok(())
    }

    /// Remove every beneficiary of a programme, with their progress and
    /// placement records. Returns the number removed. Used by the seeder.
    pub async fn clear_beneficiaries(&self, programme_id: &str) -> Result<u64, DatabaseError> {
        let removed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM beneficiaries WHERE programme_id = ?1",
                [programme_id],
            )
            .await?;
        tracing::info!(programme = %programme_id, removed, "beneficiaries cleared");
        Ok(removed)
    }
}

/// Beneficiary narrowing shared by the impact queries and export jobs.
#[derive(Debug, Default, Clone)]
pub struct BeneficiaryScope {
    pub status: Option<BeneficiaryStatus>,
    pub district: Option<String>,
    pub institution: Option<String>,
}

impl BeneficiaryScope {
    /// ` AND ...` conditions for the set fields, appending their parameters.
    /// `prefix` qualifies the `beneficiaries` columns in joins, e.g. `"b."`.
    pub(crate) fn and_clause(&self, prefix: &str, params: &mut Vec<libsql::Value>) -> String {
        let mut clause = String::new();
        if let Some(status) = self.status {
            params.push(status.as_str().into());
            clause.push_str(&format!(" AND {prefix}status = ?{}", params.len()));
        }
        if let Some(ref district) = self.district {
            params.push(district.clone().into());
            clause.push_str(&format!(" AND {prefix}district = ?{}", params.len()));
        }
        if let Some(ref institution) = self.institution {
            params.push(institution.clone().into());
            clause.push_str(&format!(" AND {prefix}institution_id = ?{}", params.len()));
        }
        clause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{create_test_programme, enrol, manager, test_service};
    use pretty_assertions::assert_eq;
    use skt_core::validation::parse_date;

    fn learner(id: &str, cohort: Option<&str>, enrolled: &str) -> NewBeneficiary {
        NewBeneficiary {
            cohort_code: cohort.map(String::from),
            enrolled_at: Some(parse_date("enrolled_at", enrolled).unwrap()),
            ..NewBeneficiary::enrolled(id)
        }
    }

    fn page(limit: u32) -> PageRequest {
        PageRequest { page: 1, limit }
    }

    #[tokio::test]
    async fn create_beneficiary_creates_progress_record() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "LEARNER001").await;

        assert!(beneficiary.id.starts_with("ben-"));
        assert_eq!(beneficiary.status, BeneficiaryStatus::Enrolled);

        let detail = svc.get_beneficiary(&beneficiary.id).await.unwrap();
        assert_eq!(detail.beneficiary, beneficiary);
        let progress = detail.progress_record.unwrap();
        assert_eq!(progress.training_pct, 0.0);
        assert!(progress.milestones.is_empty());
        assert!(detail.placement_record.is_none());
    }

    #[tokio::test]
    async fn duplicate_learner_rejected() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        enrol(&svc, &programme.id, "LEARNER001").await;

        let err = svc
            .create_beneficiary(&programme.id, NewBeneficiary::enrolled("LEARNER001"), &manager())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), DUPLICATE_LEARNER);
    }

    #[tokio::test]
    async fn same_learner_in_two_programmes() {
        let svc = test_service().await;
        let first = create_test_programme(&svc, "P1").await;
        let second = create_test_programme(&svc, "P2").await;
        enrol(&svc, &first.id, "LEARNER001").await;
        enrol(&svc, &second.id, "LEARNER001").await;
    }

    #[tokio::test]
    async fn unknown_programme_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .create_beneficiary("prg-missing", NewBeneficiary::enrolled("L1"), &manager())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Programme not found");
    }

    #[tokio::test]
    async fn missing_beneficiary() {
        let svc = test_service().await;
        let err = svc.get_beneficiary("ben-missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Beneficiary not found");
    }

    #[tokio::test]
    async fn list_sorts_by_enrolment_and_searches() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        for (id, cohort, date) in [
            ("LEARNER001", Some("ALPHA-1"), "2025-01-01"),
            ("LEARNER002", Some("BETA-1"), "2025-01-03"),
            ("TRAINEE003", Some("alpha-2"), "2025-01-02"),
        ] {
            svc.create_beneficiary(&programme.id, learner(id, cohort, date), &manager())
                .await
                .unwrap();
        }

        let all = svc
            .list_beneficiaries(&programme.id, &BeneficiaryFilter::default(), page(10))
            .await
            .unwrap();
        let order: Vec<_> = all.items.iter().map(|d| d.beneficiary.learner_id.as_str()).collect();
        assert_eq!(order, vec!["LEARNER002", "TRAINEE003", "LEARNER001"]);
        assert!(all.items.iter().all(|d| d.progress_record.is_some()));

        let by_cohort = svc
            .list_beneficiaries(
                &programme.id,
                &BeneficiaryFilter {
                    q: Some("Alpha".into()),
                    ..BeneficiaryFilter::default()
                },
                page(10),
            )
            .await
            .unwrap();
        assert_eq!(by_cohort.pagination.total, 2);

        let by_learner = svc
            .list_beneficiaries(
                &programme.id,
                &BeneficiaryFilter {
                    q: Some("learner".into()),
                    ..BeneficiaryFilter::default()
                },
                page(1),
            )
            .await
            .unwrap();
        assert_eq!(by_learner.items.len(), 1);
        assert_eq!(by_learner.pagination, Pagination { current: 1, pages: 2, total: 2 });
    }

    #[tokio::test]
    async fn search_matches_non_ascii_ids() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        enrol(&svc, &programme.id, "ÉLÈVE-01").await;
        enrol(&svc, &programme.id, "LEARNER002").await;

        for q in ["ÉLÈVE", "ÉlÈve-01"] {
            let found = svc
                .list_beneficiaries(
                    &programme.id,
                    &BeneficiaryFilter {
                        q: Some(q.into()),
                        ..BeneficiaryFilter::default()
                    },
                    page(10),
                )
                .await
                .unwrap();
            let ids: Vec<_> = found.items.iter().map(|d| d.beneficiary.learner_id.as_str()).collect();
            assert_eq!(ids, vec!["ÉLÈVE-01"], "q = {q}");
        }
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let a = enrol(&svc, &programme.id, "L1").await;
        enrol(&svc, &programme.id, "L2").await;
        svc.update_beneficiary_status(&a.id, BeneficiaryStatus::Certified, &manager())
            .await
            .unwrap();

        let certified = svc
            .list_beneficiaries(
                &programme.id,
                &BeneficiaryFilter {
                    status: Some(BeneficiaryStatus::Certified),
                    ..BeneficiaryFilter::default()
                },
                page(10),
            )
            .await
            .unwrap();
        assert_eq!(certified.items.len(), 1);
        assert_eq!(certified.items[0].beneficiary.id, a.id);
    }

    #[tokio::test]
    async fn status_change_is_audited_with_old_status() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;

        let updated = svc
            .update_beneficiary_status(&beneficiary.id, BeneficiaryStatus::Dropped, &manager())
            .await
            .unwrap();
        assert_eq!(updated.status, BeneficiaryStatus::Dropped);

        let events = svc
            .query_audit(&AuditFilter {
                action: Some(AuditAction::UpdateBeneficiaryStatus),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].meta,
            serde_json::json!({"old_status": "ENROLLED", "new_status": "DROPPED"})
        );
    }

    #[tokio::test]
    async fn beneficiaries_survive_programme_deletion() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;

        svc.delete_programme(&programme.id, &manager()).await.unwrap();
        assert!(svc.get_beneficiary(&beneficiary.id).await.is_ok());
    }

    #[tokio::test]
    async fn clear_removes_progress_too() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        let beneficiary = enrol(&svc, &programme.id, "L1").await;
        enrol(&svc, &programme.id, "L2").await;

        assert_eq!(svc.clear_beneficiaries(&programme.id).await.unwrap(), 2);
        assert!(svc.get_progress(&beneficiary.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scope_narrows_programme_beneficiaries() {
        let svc = test_service().await;
        let programme = create_test_programme(&svc, "PSD25").await;
        for (id, district) in [("L1", "Pune"), ("L2", "Mumbai"), ("L3", "Pune")] {
            let new = NewBeneficiary {
                district: Some(district.into()),
                ..NewBeneficiary::enrolled(id)
            };
            svc.create_beneficiary(&programme.id, new, &manager()).await.unwrap();
        }

        let pune = svc
            .programme_beneficiaries(
                &programme.id,
                &BeneficiaryScope {
                    district: Some("Pune".into()),
                    ..BeneficiaryScope::default()
                },
            )
            .await
            .unwrap();
        let ids: Vec<_> = pune.iter().map(|b| b.learner_id.as_str()).collect();
        assert_eq!(ids, vec!["L1", "L3"]);
    }
}
