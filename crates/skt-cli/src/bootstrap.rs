use anyhow::Context;
use skt_config::SktConfig;
use skt_db::service::SktService;

use crate::cli::GlobalFlags;

/// Load `.env`, then the layered configuration. `--config` adds an explicit
/// file above the project and user files.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<SktConfig> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            tracing::warn!(%error, "failed to read .env; continuing without it");
        }
    }

    let config = match &flags.config {
        Some(path) => SktConfig::load_from(path)?,
        None => SktConfig::load()?,
    };
    tracing::debug!(database = %config.database.path, "configuration loaded");
    Ok(config)
}

/// Open the configured database.
pub async fn open_service(config: &SktConfig) -> anyhow::Result<SktService> {
    SktService::from_config(config)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))
}
