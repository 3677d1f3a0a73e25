//! Evidence bundle repository: requests, lazy expiry, download gating.

use chrono::Duration;

use skt_core::audit_detail::{EvidenceDownloadedDetail, EvidenceRequestedDetail};
use skt_core::entities::{EvidenceBundle, EvidenceItem};
use skt_core::enums::{AuditAction, EvidenceStatus, EvidenceType, ResourceType};
use skt_core::ids::PREFIX_EVIDENCE;
use skt_core::responses::{EvidenceDownload, Page, PageRequest, Pagination};
use skt_core::validation::NewEvidenceBundle;

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_ts, get_opt_string, get_u64, now, parse_datetime, parse_enum, parse_json, sql_int,
    to_json_text,
};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

const SELECT_COLS: &str = "id, programme_id, beneficiary_id, type, items, generated_at, \
     requested_by, expires_at, status, download_count, file_size, error_message";

fn row_to_bundle(row: &libsql::Row) -> Result<EvidenceBundle, DatabaseError> {
    let download_count = get_u64(row, 9)?;
    Ok(EvidenceBundle {
        id: row.get(0)?,
        programme_id: row.get(1)?,
        beneficiary_id: get_opt_string(row, 2)?,
        bundle_type: parse_enum(&row.get::<String>(3)?)?,
        items: parse_json(&row.get::<String>(4)?)?,
        generated_at: parse_datetime(&row.get::<String>(5)?)?,
        requested_by: row.get(6)?,
        expires_at: parse_datetime(&row.get::<String>(7)?)?,
        status: parse_enum(&row.get::<String>(8)?)?,
        download_count: u32::try_from(download_count).unwrap_or(u32::MAX),
        file_size: row
            .get::<Option<i64>>(10)?
            .map(|size| u64::try_from(size).unwrap_or_default()),
        error_message: get_opt_string(row, 11)?,
    })
}

/// Filter criteria for evidence bundle listings.
#[derive(Debug, Default, Clone)]
pub struct EvidenceFilter {
    /// `None` lists bundles of every programme.
    pub programme_id: Option<String>,
    pub status: Option<EvidenceStatus>,
    pub bundle_type: Option<EvidenceType>,
}

/// Path clients fetch a ready bundle's content from.
fn download_url(bundle_id: &str) -> String {
    format!("/api/evidence/download-file/{bundle_id}")
}

impl SktService {
    /// Record a bundle request in GENERATING state. The caller starts the
    /// generation job.
    pub async fn request_evidence_bundle(
        &self,
        programme_id: &str,
        new: NewEvidenceBundle,
        actor: &Actor,
    ) -> Result<EvidenceBundle, DatabaseError> {
        self.get_programme(programme_id).await?;

        let now = now();
        let expires_at = now + Duration::days(i64::from(new.expires_in_days));
        let id = self.db().generate_id(PREFIX_EVIDENCE).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO evidence_bundles (id, programme_id, beneficiary_id, type, items, generated_at, requested_by, expires_at, status, download_count)
                 VALUES (?1, ?2, ?3, ?4, '[]', ?5, ?6, ?7, ?8, 0)",
                libsql::params![
                    id.as_str(),
                    programme_id,
                    new.beneficiary_id.as_deref(),
                    new.bundle_type.as_str(),
                    fmt_ts(now),
                    new.requested_by.as_str(),
                    fmt_ts(expires_at),
                    EvidenceStatus::Generating.as_str()
                ],
            )
            .await?;

        let bundle = EvidenceBundle {
            id: id.clone(),
            programme_id: programme_id.to_string(),
            beneficiary_id: new.beneficiary_id,
            bundle_type: new.bundle_type,
            items: Vec::new(),
            generated_at: now,
            requested_by: new.requested_by,
            expires_at,
            status: EvidenceStatus::Generating,
            download_count: 0,
            file_size: None,
            error_message: None,
        };

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::GenerateEvidenceBundle,
                resource_type: ResourceType::EvidenceBundle,
                resource_id: Some(&id),
                meta: EvidenceRequestedDetail {
                    bundle_type: bundle.bundle_type,
                    beneficiary_id: bundle.beneficiary_id.clone(),
                    expires_in_days: new.expires_in_days,
                },
            },
        )
        .await?;

        Ok(bundle)
    }

    /// Fetch a bundle as stored, without the expiry check.
    pub(crate) async fn fetch_evidence_bundle(
        &self,
        id: &str,
    ) -> Result<EvidenceBundle, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM evidence_bundles WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Evidence bundle"))?;
        row_to_bundle(&row)
    }

    /// Fetch a bundle. A READY bundle past its expiry is flipped to EXPIRED.
    pub async fn get_evidence_bundle(&self, id: &str) -> Result<EvidenceBundle, DatabaseError> {
        let mut bundle = self.fetch_evidence_bundle(id).await?;
        if bundle.status == EvidenceStatus::Ready && bundle.is_expired_at(now()) {
            self.set_evidence_status(&bundle, EvidenceStatus::Expired, None)
                .await?;
            bundle.status = EvidenceStatus::Expired;
        }
        Ok(bundle)
    }

    /// Hand out the download location of a READY, unexpired bundle and count
    /// the download.
    pub async fn download_evidence_bundle(
        &self,
        id: &str,
        actor: &Actor,
    ) -> Result<EvidenceDownload, DatabaseError> {
        let bundle = self.fetch_evidence_bundle(id).await?;
        match bundle.status {
            EvidenceStatus::Ready if bundle.is_expired_at(now()) => {
                self.set_evidence_status(&bundle, EvidenceStatus::Expired, None)
                    .await?;
                return Err(expired());
            }
            EvidenceStatus::Ready => {}
            EvidenceStatus::Expired => return Err(expired()),
            EvidenceStatus::Generating | EvidenceStatus::Failed => {
                return Err(DatabaseError::InvalidState(
                    "Bundle is not ready for download".into(),
                ));
            }
        }

        self.db()
            .conn()
            .execute(
                "UPDATE evidence_bundles SET download_count = download_count + 1 WHERE id = ?1",
                [id],
            )
            .await?;
        let download_count = bundle.download_count.saturating_add(1);

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(&bundle.programme_id),
                action: AuditAction::DownloadEvidenceBundle,
                resource_type: ResourceType::EvidenceBundle,
                resource_id: Some(id),
                meta: EvidenceDownloadedDetail { download_count },
            },
        )
        .await?;

        Ok(EvidenceDownload {
            download_url: download_url(id),
            expires_at: bundle.expires_at,
            download_count,
        })
    }

    /// Bundles newest first.
    pub async fn list_evidence_bundles(
        &self,
        filter: &EvidenceFilter,
        page: PageRequest,
    ) -> Result<Page<EvidenceBundle>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(ref programme_id) = filter.programme_id {
            params.push(programme_id.clone().into());
            conditions.push(format!("programme_id = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(bundle_type) = filter.bundle_type {
            params.push(bundle_type.as_str().into());
            conditions.push(format!("type = ?{}", params.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM evidence_bundles {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = match rows.next().await? {
            Some(row) => get_u64(&row, 0)?,
            None => 0,
        };

        let sql = format!(
            "SELECT {SELECT_COLS} FROM evidence_bundles {where_clause}
             ORDER BY generated_at DESC, rowid DESC LIMIT {} OFFSET {}",
            page.limit,
            sql_int(page.offset())
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_bundle(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    /// Store generated items and mark the bundle READY.
    pub(crate) async fn mark_evidence_ready(
        &self,
        bundle: &EvidenceBundle,
        items: &[EvidenceItem],
        file_size: u64,
    ) -> Result<(), DatabaseError> {
        check_evidence_transition(bundle, EvidenceStatus::Ready)?;
        self.db()
            .conn()
            .execute(
                "UPDATE evidence_bundles SET status = ?1, items = ?2, file_size = ?3 WHERE id = ?4",
                libsql::params![
                    EvidenceStatus::Ready.as_str(),
                    to_json_text(items)?,
                    sql_int(file_size),
                    bundle.id.as_str()
                ],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn set_evidence_status(
        &self,
        bundle: &EvidenceBundle,
        next: EvidenceStatus,
        error_message: Option<&str>,
    ) -> Result<(), DatabaseError> {
        check_evidence_transition(bundle, next)?;
        self.db()
            .conn()
            .execute(
                "UPDATE evidence_bundles SET status = ?1, error_message = coalesce(?2, error_message) WHERE id = ?3",
                libsql::params![next.as_str(), error_message, bundle.id.as_str()],
            )
            .await?;
        Ok(())
    }
}

fn expired() -> DatabaseError {
    DatabaseError::Expired("Bundle has expired".into())
}

fn check_evidence_transition(
    bundle: &EvidenceBundle,
    next: EvidenceStatus,
) -> Result<(), DatabaseError> {
    if bundle.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(DatabaseError::InvalidState(format!(
            "Evidence bundle cannot move from {} to {next}",
            bundle.status
        )))
    }
}
