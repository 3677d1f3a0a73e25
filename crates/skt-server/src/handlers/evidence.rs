//! Evidence bundle endpoints.

use axum::extract::State;
use serde::Deserialize;
use skt_core::entities::EvidenceBundle;
use skt_core::responses::{EvidenceDownload, EvidenceRequested};
use skt_core::validation::EvidenceRequest;
use skt_db::jobs::spawn_evidence_bundle;
use skt_db::repos::evidence::EvidenceFilter;

use crate::error::ApiResult;
use crate::extract::{enum_param, text_param, ApiJson, ApiPath, ApiQuery, RequestMeta};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Actor recorded for downloads without an `x-user-id` header.
const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Default, Deserialize)]
pub struct EvidenceListQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub bundle_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `POST /api/evidence/bundle/{programme_id}`. Answers 202 while the bundle
/// is generated in the background.
pub async fn request_bundle(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(programme_id): ApiPath<String>,
    ApiJson(request): ApiJson<EvidenceRequest>,
) -> ApiResult<ApiResponse<EvidenceRequested>> {
    let new = request.validate(state.config.jobs.evidence_expiry_days)?;
    let actor = meta.actor(Some(new.requested_by.as_str()), ANONYMOUS);
    let bundle = state
        .svc
        .request_evidence_bundle(&programme_id, new, &actor)
        .await?;

    spawn_evidence_bundle(state.svc.clone(), bundle.id.clone());
    tracing::info!(bundle = %bundle.id, programme = %programme_id, "evidence bundle queued");

    Ok(ApiResponse::accepted(EvidenceRequested {
        bundle_id: bundle.id,
        status: bundle.status,
        expires_at: bundle.expires_at,
    }))
}

pub async fn get_bundle(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<EvidenceBundle>> {
    Ok(ApiResponse::ok(state.svc.get_evidence_bundle(&id).await?))
}

pub async fn download_bundle(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<EvidenceDownload>> {
    let actor = meta.header_actor(ANONYMOUS);
    Ok(ApiResponse::ok(
        state.svc.download_evidence_bundle(&id, &actor).await?,
    ))
}

/// `GET /api/evidence/programme/{programme_id}`; `all` lists every programme.
pub async fn list_bundles(
    State(state): State<AppState>,
    ApiPath(programme_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<EvidenceListQuery>,
) -> ApiResult<ApiResponse<Vec<EvidenceBundle>>> {
    let filter = EvidenceFilter {
        programme_id: text_param(Some(programme_id)),
        status: enum_param("status", query.status.as_deref())?,
        bundle_type: enum_param("type", query.bundle_type.as_deref())?,
    };
    let page = state.page(query.page, query.limit, None);
    Ok(ApiResponse::page(
        state.svc.list_evidence_bundles(&filter, page).await?,
    ))
}
