//! # skt-server
//!
//! REST API for SkillTrack, built on axum.
//!
//! Every `/api` response is wrapped in the `{success, data, error,
//! pagination, message}` envelope from [`response`]. Storage and validation
//! errors are mapped to HTTP statuses by [`error::ApiError`]. Evidence bundle
//! and export requests are acknowledged immediately; the work runs on
//! background tasks spawned from the handlers.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

pub use routes::build_router;
pub use state::AppState;

/// Serve the API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "SkillTrack API listening");
    }
    let app = build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
