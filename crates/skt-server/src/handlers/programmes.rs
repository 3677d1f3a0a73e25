//! Programme, target, and funding rule endpoints.

use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use skt_core::entities::{FundingRule, Programme, ProgrammeTarget};
use skt_core::validation::{
    FundingRuleRequest, ProgrammeRequest, ProgrammeUpdateRequest, TargetRequest,
};
use skt_db::repos::audit::SYSTEM_ACTOR;
use skt_db::repos::programme::ProgrammeFilter;

use crate::error::ApiResult;
use crate::extract::{enum_param, text_param, ApiJson, ApiPath, ApiQuery, Authored, RequestMeta};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Programme listings page by ten unless asked otherwise.
const PROGRAMME_PAGE_SIZE: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct ProgrammeListQuery {
    pub sponsor_type: Option<String>,
    pub sector: Option<String>,
    pub district: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct DeleteRequest {
    deleted_by: Option<String>,
}

pub async fn create_programme(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ProgrammeRequest>,
) -> ApiResult<ApiResponse<Programme>> {
    let programme = state.svc.create_programme(request.validate()?).await?;
    Ok(ApiResponse::created(programme))
}

pub async fn list_programmes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProgrammeListQuery>,
) -> ApiResult<ApiResponse<Vec<Programme>>> {
    let filter = ProgrammeFilter {
        sponsor_type: enum_param("sponsor_type", query.sponsor_type.as_deref())?,
        sector: text_param(query.sector),
        district: text_param(query.district),
        status: enum_param("status", query.status.as_deref())?,
    };
    let page = state.page(query.page, query.limit, Some(PROGRAMME_PAGE_SIZE));
    let programmes = state.svc.list_programmes(&filter, page).await?;
    Ok(ApiResponse::page(programmes))
}

pub async fn get_programme(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<Programme>> {
    Ok(ApiResponse::ok(state.svc.get_programme(&id).await?))
}

pub async fn update_programme(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<ProgrammeUpdateRequest>,
) -> ApiResult<ApiResponse<Programme>> {
    let (changes, updated_by) = request.validate()?;
    let actor = meta.actor(updated_by.as_deref(), SYSTEM_ACTOR);
    let programme = state
        .svc
        .update_programme(&id, changes.into(), &actor)
        .await?;
    Ok(ApiResponse::ok(programme))
}

/// The body is optional; `deleted_by` falls back to the `x-user-id` header.
pub async fn delete_programme(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
    body: Bytes,
) -> ApiResult<ApiResponse<()>> {
    let request: DeleteRequest = serde_json::from_slice(&body).unwrap_or_default();
    let actor = match request.deleted_by {
        Some(ref deleted_by) => meta.actor(Some(deleted_by.as_str()), SYSTEM_ACTOR),
        None => meta.header_actor(SYSTEM_ACTOR),
    };
    state.svc.delete_programme(&id, &actor).await?;
    Ok(ApiResponse::message("Programme deleted successfully"))
}

pub async fn add_target(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<Authored<TargetRequest>>,
) -> ApiResult<ApiResponse<ProgrammeTarget>> {
    let actor = meta.actor(request.created_by.as_deref(), SYSTEM_ACTOR);
    let target = state
        .svc
        .add_target(&id, request.body.validate()?, &actor)
        .await?;
    Ok(ApiResponse::created(target))
}

pub async fn list_targets(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<Vec<ProgrammeTarget>>> {
    Ok(ApiResponse::ok(state.svc.list_targets(&id).await?))
}

pub async fn add_funding_rule(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<Authored<FundingRuleRequest>>,
) -> ApiResult<ApiResponse<FundingRule>> {
    let actor = meta.actor(request.created_by.as_deref(), SYSTEM_ACTOR);
    let rule = state
        .svc
        .add_funding_rule(&id, request.body.validate()?, &actor)
        .await?;
    Ok(ApiResponse::created(rule))
}

pub async fn list_funding_rules(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<Vec<FundingRule>>> {
    Ok(ApiResponse::ok(state.svc.list_funding_rules(&id, false).await?))
}
