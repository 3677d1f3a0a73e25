//! Audit trail query endpoint.

use axum::extract::State;
use serde::Deserialize;
use skt_core::entities::AuditEvent;
use skt_db::repos::audit::AuditFilter;

use crate::error::ApiResult;
use crate::extract::{enum_param, text_param, ApiQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub programme_id: Option<String>,
    pub actor_id: Option<String>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub limit: Option<u32>,
}

/// `GET /api/audit`, newest first. `limit` is capped at the maximum page
/// size.
pub async fn list_audit(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> ApiResult<ApiResponse<Vec<AuditEvent>>> {
    let max = state.config.general.max_page_size.max(1);
    let filter = AuditFilter {
        programme_id: text_param(query.programme_id),
        actor_id: text_param(query.actor_id),
        action: enum_param("action", query.action.as_deref())?,
        resource_type: enum_param("resource_type", query.resource_type.as_deref())?,
        limit: Some(query.limit.unwrap_or(max).clamp(1, max)),
    };
    Ok(ApiResponse::ok(state.svc.query_audit(&filter).await?))
}
