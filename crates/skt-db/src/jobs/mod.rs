//! Fire-and-forget background jobs.
//!
//! Handlers record a GENERATING bundle or PENDING export, respond, and hand
//! the id to one of the `spawn_*` helpers. Jobs never return errors: a
//! failure is written to the record's `error_message` and logged.

mod evidence;
mod export;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::service::SktService;

/// Generate an evidence bundle on the runtime. Nothing needs to await the
/// handle; tests do.
pub fn spawn_evidence_bundle(svc: Arc<SktService>, bundle_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        svc.generate_evidence_bundle(&bundle_id).await;
    })
}

/// Process an export job on the runtime.
pub fn spawn_export_job(svc: Arc<SktService>, job_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        svc.process_export_job(&job_id).await;
    })
}
