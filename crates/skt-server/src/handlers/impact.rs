//! Impact dashboard, cost KPI, and trend endpoints.

use axum::extract::State;
use serde::Deserialize;
use skt_core::impact::DashboardWindow;
use skt_core::responses::{CostKpis, Dashboard, TrendPoint};
use skt_db::repos::beneficiary::BeneficiaryScope;

use crate::error::ApiResult;
use crate::extract::{text_param, ApiPath, ApiQuery};
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_TREND_METRIC: &str = "PLACED";
const DEFAULT_TREND_DAYS: u32 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub window: Option<String>,
    pub district: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    pub metric: Option<String>,
    pub days: Option<u32>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    ApiPath(programme_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> ApiResult<ApiResponse<Dashboard>> {
    let window = DashboardWindow::parse(query.window.as_deref());
    let scope = BeneficiaryScope {
        status: None,
        district: text_param(query.district),
        institution: text_param(query.institution),
    };
    let dashboard = state
        .svc
        .impact_dashboard(&programme_id, window, &scope)
        .await?;
    Ok(ApiResponse::ok(dashboard))
}

pub async fn cost_kpis(
    State(state): State<AppState>,
    ApiPath(programme_id): ApiPath<String>,
) -> ApiResult<ApiResponse<CostKpis>> {
    Ok(ApiResponse::ok(state.svc.cost_kpis(&programme_id).await?))
}

pub async fn trends(
    State(state): State<AppState>,
    ApiPath(programme_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> ApiResult<ApiResponse<Vec<TrendPoint>>> {
    let metric = query
        .metric
        .as_deref()
        .unwrap_or(DEFAULT_TREND_METRIC)
        .to_ascii_uppercase();
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    Ok(ApiResponse::ok(
        state.svc.trends(&programme_id, &metric, days).await?,
    ))
}
