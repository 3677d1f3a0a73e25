//! Export job repository.

use chrono::{DateTime, Utc};

use skt_core::audit_detail::{ExportDownloadedDetail, ExportRequestedDetail};
use skt_core::entities::ExportJob;
use skt_core::enums::{AuditAction, ExportFormat, ExportStatus, ResourceType};
use skt_core::ids::PREFIX_EXPORT;
use skt_core::responses::{ExportDownload, Page, PageRequest, Pagination};
use skt_core::validation::NewExportJob;

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_ts, get_bool, get_opt_string, get_u64, now, parse_datetime, parse_enum, parse_json,
    parse_optional_datetime, sql_int, to_json_text,
};
use crate::repos::audit::{Actor, AuditRecord};
use crate::service::SktService;

const SELECT_COLS: &str = "id, programme_id, format, destination, status, requested_by, \
     requested_at, completed_at, file_path, error_message, filters, include_pii";

fn row_to_export(row: &libsql::Row) -> Result<ExportJob, DatabaseError> {
    Ok(ExportJob {
        id: row.get(0)?,
        programme_id: row.get(1)?,
        format: parse_enum(&row.get::<String>(2)?)?,
        destination: parse_enum(&row.get::<String>(3)?)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        requested_by: row.get(5)?,
        requested_at: parse_datetime(&row.get::<String>(6)?)?,
        completed_at: parse_optional_datetime(get_opt_string(row, 7)?.as_deref())?,
        file_path: get_opt_string(row, 8)?,
        error_message: get_opt_string(row, 9)?,
        filters: parse_json(&row.get::<String>(10)?)?,
        include_pii: get_bool(row, 11)?,
    })
}

/// Filter criteria for export job listings.
#[derive(Debug, Default, Clone)]
pub struct ExportFilter {
    /// `None` lists jobs of every programme.
    pub programme_id: Option<String>,
    pub status: Option<ExportStatus>,
    pub format: Option<ExportFormat>,
}

impl SktService {
    /// Record a PENDING export job. The caller starts processing when the
    /// schedule asks for it.
    pub async fn create_export_job(
        &self,
        programme_id: &str,
        new: NewExportJob,
        actor: &Actor,
    ) -> Result<ExportJob, DatabaseError> {
        self.get_programme(programme_id).await?;

        let now = now();
        let id = self.db().generate_id(PREFIX_EXPORT).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO export_jobs (id, programme_id, format, destination, status, requested_by, requested_at, filters, include_pii)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    id.as_str(),
                    programme_id,
                    new.format.as_str(),
                    new.destination.as_str(),
                    ExportStatus::Pending.as_str(),
                    new.requested_by.as_str(),
                    fmt_ts(now),
                    to_json_text(&new.filters)?,
                    i64::from(new.include_pii)
                ],
            )
            .await?;

        let job = ExportJob {
            id: id.clone(),
            programme_id: programme_id.to_string(),
            format: new.format,
            destination: new.destination,
            status: ExportStatus::Pending,
            requested_by: new.requested_by,
            requested_at: now,
            completed_at: None,
            file_path: None,
            error_message: None,
            filters: new.filters,
            include_pii: new.include_pii,
        };

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(programme_id),
                action: AuditAction::CreateExportJob,
                resource_type: ResourceType::ExportJob,
                resource_id: Some(&id),
                meta: ExportRequestedDetail {
                    format: job.format,
                    destination: job.destination,
                    include_pii: job.include_pii,
                },
            },
        )
        .await?;

        Ok(job)
    }

    pub async fn get_export_job(&self, id: &str) -> Result<ExportJob, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM export_jobs WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Export job"))?;
        row_to_export(&row)
    }

    /// Jobs newest first.
    pub async fn list_export_jobs(
        &self,
        filter: &ExportFilter,
        page: PageRequest,
    ) -> Result<Page<ExportJob>, DatabaseError> {
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
        if let Some(format) = filter.format {
            params.push(format.as_str().into());
            conditions.push(format!("format = ?{}", params.len()));
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
                &format!("SELECT COUNT(*) FROM export_jobs {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = match rows.next().await? {
            Some(row) => get_u64(&row, 0)?,
            None => 0,
        };

        let sql = format!(
            "SELECT {SELECT_COLS} FROM export_jobs {where_clause}
             ORDER BY requested_at DESC, rowid DESC LIMIT {} OFFSET {}",
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
            items.push(row_to_export(&row)?);
        }

        Ok(Page {
            items,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    /// Describe where a completed export can be fetched from.
    pub async fn export_download(
        &self,
        id: &str,
        actor: &Actor,
    ) -> Result<ExportDownload, DatabaseError> {
        let job = self.get_export_job(id).await?;
        if job.status != ExportStatus::Completed {
            return Err(DatabaseError::InvalidState(
                "Export job is not completed yet".into(),
            ));
        }
        let file_path = job
            .file_path
            .clone()
            .ok_or_else(|| DatabaseError::NotFound("Export file not found".into()))?;

        self.record_audit(
            actor,
            AuditRecord {
                programme_id: Some(&job.programme_id),
                action: AuditAction::DownloadExport,
                resource_type: ResourceType::ExportJob,
                resource_id: Some(id),
                meta: ExportDownloadedDetail {
                    format: job.format,
                    include_pii: job.include_pii,
                },
            },
        )
        .await?;

        Ok(ExportDownload {
            download_url: format!("/api/exports/file/{id}"),
            file_path,
            format: job.format,
        })
    }

    /// Move a job to `next`, recording completion details when given.
    pub(crate) async fn transition_export_job(
        &self,
        job: &ExportJob,
        next: ExportStatus,
        completion: ExportCompletion<'_>,
    ) -> Result<(), DatabaseError> {
        if !job.status.can_transition_to(next) {
            return Err(DatabaseError::InvalidState(format!(
                "Export job cannot move from {} to {next}",
                job.status
            )));
        }
        self.db()
            .conn()
            .execute(
                "UPDATE export_jobs
                 SET status = ?1,
                     completed_at = coalesce(?2, completed_at),
                     file_path = coalesce(?3, file_path),
                     error_message = coalesce(?4, error_message)
                 WHERE id = ?5",
                libsql::params![
                    next.as_str(),
                    completion.completed_at.map(fmt_ts),
                    completion.file_path,
                    completion.error_message,
                    job.id.as_str()
                ],
            )
            .await?;
        Ok(())
    }
}

/// Optional fields written alongside an export status change.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ExportCompletion<'a> {
    pub completed_at: Option<DateTime<Utc>>,
    pub file_path: Option<&'a str>,
    pub error_message: Option<&'a str>,
}
