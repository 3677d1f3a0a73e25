//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use skt_config::SktConfig;
use skt_core::responses::PageRequest;
use skt_db::service::SktService;

#[derive(Clone)]
pub struct AppState {
    pub svc: Arc<SktService>,
    pub config: Arc<SktConfig>,
    started: Instant,
}

impl AppState {
    pub fn new(svc: SktService, config: SktConfig) -> Self {
        Self {
            svc: Arc::new(svc),
            config: Arc::new(config),
            started: Instant::now(),
        }
    }

    /// Seconds since the state was built.
    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Clamp raw paging parameters. `default_limit` overrides the configured
    /// page size for endpoints with their own default.
    pub fn page(&self, page: Option<u32>, limit: Option<u32>, default_limit: Option<u32>) -> PageRequest {
        let general = &self.config.general;
        PageRequest::clamped(
            page,
            limit,
            default_limit.unwrap_or(general.default_page_size),
            general.max_page_size,
        )
    }
}
