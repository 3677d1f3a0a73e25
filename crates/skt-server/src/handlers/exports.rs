//! Export job endpoints.

use axum::extract::State;
use serde::Deserialize;
use skt_core::entities::ExportJob;
use skt_core::enums::ExportSchedule;
use skt_core::responses::ExportDownload;
use skt_core::validation::ExportRequest;
use skt_db::jobs::spawn_export_job;
use skt_db::repos::export::ExportFilter;

use crate::error::ApiResult;
use crate::extract::{enum_param, text_param, ApiJson, ApiPath, ApiQuery, RequestMeta};
use crate::response::ApiResponse;
use crate::state::AppState;

const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Default, Deserialize)]
pub struct ExportListQuery {
    pub status: Option<String>,
    pub format: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `POST /api/exports/{programme_id}`. A `NOW` schedule starts processing in
/// the background; `LATER` jobs stay PENDING.
pub async fn create_export(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(programme_id): ApiPath<String>,
    ApiJson(request): ApiJson<ExportRequest>,
) -> ApiResult<ApiResponse<ExportJob>> {
    let new = request.validate()?;
    let schedule = new.schedule;
    let actor = meta.actor(Some(new.requested_by.as_str()), ANONYMOUS);
    let job = state
        .svc
        .create_export_job(&programme_id, new, &actor)
        .await?;

    if schedule == ExportSchedule::Now {
        spawn_export_job(state.svc.clone(), job.id.clone());
        tracing::info!(job = %job.id, format = %job.format, "export job queued");
    }
    Ok(ApiResponse::created(job))
}

pub async fn get_export(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<ExportJob>> {
    Ok(ApiResponse::ok(state.svc.get_export_job(&id).await?))
}

pub async fn list_exports(
    State(state): State<AppState>,
    ApiPath(programme_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ExportListQuery>,
) -> ApiResult<ApiResponse<Vec<ExportJob>>> {
    let filter = ExportFilter {
        programme_id: text_param(Some(programme_id)),
        status: enum_param("status", query.status.as_deref())?,
        format: enum_param("format", query.format.as_deref())?,
    };
    let page = state.page(query.page, query.limit, None);
    Ok(ApiResponse::page(state.svc.list_export_jobs(&filter, page).await?))
}

pub async fn download_export(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<ExportDownload>> {
    let actor = meta.header_actor(ANONYMOUS);
    Ok(ApiResponse::ok(state.svc.export_download(&id, &actor).await?))
}
