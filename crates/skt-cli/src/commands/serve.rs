use anyhow::Context;
use skt_config::SktConfig;
use skt_server::AppState;

use crate::bootstrap;
use crate::cli::root_commands::ServeArgs;

/// Handle `skt serve`: run the API until Ctrl-C.
pub async fn handle(args: &ServeArgs, mut config: SktConfig) -> anyhow::Result<()> {
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let svc = bootstrap::open_service(&config).await?;
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let state = AppState::new(svc, config);
    skt_server::serve(listener, state, shutdown_signal())
        .await
        .context("API server stopped unexpectedly")?;

    tracing::info!("SkillTrack API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
