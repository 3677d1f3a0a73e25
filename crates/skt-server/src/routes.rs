//! API route definitions.

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{audit, beneficiaries, evidence, exports, health, impact, programmes};
use crate::middleware::logging_middleware;
use crate::response::Envelope;
use crate::state::AppState;

/// Build the full application router: `/health` plus everything under `/api`.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state
        .config
        .uploads
        .max_csv_bytes
        .saturating_mul(beneficiaries::OVERSIZE_DRAIN_FACTOR)
        .saturating_add(beneficiaries::MULTIPART_OVERHEAD);

    let programme_routes = Router::new()
        .route(
            "/",
            post(programmes::create_programme).get(programmes::list_programmes),
        )
        .route(
            "/{id}",
            get(programmes::get_programme)
                .patch(programmes::update_programme)
                .delete(programmes::delete_programme),
        )
        .route(
            "/{id}/targets",
            post(programmes::add_target).get(programmes::list_targets),
        )
        .route(
            "/{id}/funding-rules",
            post(programmes::add_funding_rule).get(programmes::list_funding_rules),
        );

    let beneficiary_routes = Router::new()
        .route("/", post(beneficiaries::create_beneficiary))
        .route("/programme/{id}", get(beneficiaries::list_beneficiaries))
        .route(
            "/import/{id}",
            post(beneficiaries::import_csv).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/{id}", get(beneficiaries::get_beneficiary))
        .route("/{id}/status", patch(beneficiaries::update_status))
        .route("/{id}/progress", post(beneficiaries::update_progress))
        .route("/{id}/placement", post(beneficiaries::add_placement));

    let evidence_routes = Router::new()
        .route(
            "/bundle/{id}",
            post(evidence::request_bundle).get(evidence::get_bundle),
        )
        .route("/download/{id}", get(evidence::download_bundle))
        .route("/programme/{id}", get(evidence::list_bundles));

    let export_routes = Router::new()
        .route("/programme/{id}", get(exports::list_exports))
        .route("/download/{id}", get(exports::download_export))
        .route("/{id}", post(exports::create_export).get(exports::get_export));

    let impact_routes = Router::new()
        .route("/dashboard/{id}", get(impact::dashboard))
        .route("/cost-kpis/{id}", get(impact::cost_kpis))
        .route("/trends/{id}", get(impact::trends));

    let api = Router::new()
        .nest("/programmes", programme_routes)
        .nest("/beneficiaries", beneficiary_routes)
        .nest("/evidence", evidence_routes)
        .nest("/exports", export_routes)
        .nest("/impact", impact_routes)
        .route("/audit", get(audit::list_audit));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Envelope::<()>::failure("Route not found"))
}
