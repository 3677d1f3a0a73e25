//! Export renderers.
//!
//! Pure functions from a programme snapshot to file bytes. The export job
//! gathers an [`ExportData`], picks a renderer by [`ExportFormat`], and stores
//! the result under `exports/<file_name>`.

mod nsdc;
mod tabular;

use chrono::{DateTime, Utc};
use thiserror::Error;

use skt_core::entities::{
    Beneficiary, PlacementRecord, Programme, ProgrammeTarget, ProgressRecord,
};
use skt_core::enums::ExportFormat;

/// Everything a renderer needs about one programme.
#[derive(Debug, Clone)]
pub struct ExportData {
    pub programme: Programme,
    pub targets: Vec<ProgrammeTarget>,
    pub rows: Vec<ExportRow>,
    pub include_pii: bool,
    pub generated_at: DateTime<Utc>,
}

/// One beneficiary with its records.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub beneficiary: Beneficiary,
    pub progress: Option<ProgressRecord>,
    pub placement: Option<PlacementRecord>,
}

/// A rendered export ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedExport {
    pub file_name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unsupported export format")]
    Unsupported(ExportFormat),

    #[error("CSV rendering failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON rendering failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// Render `data` as `format`. File names carry the programme code and the
/// generation time in epoch milliseconds.
///
/// # Errors
///
/// Returns [`RenderError::Unsupported`] for PDF and STATE, otherwise any
/// serializer failure.
pub fn render(format: ExportFormat, data: &ExportData) -> Result<RenderedExport, RenderError> {
    let code = file_safe(&data.programme.code);
    let stamp = data.generated_at.timestamp_millis();
    match format {
        ExportFormat::Csv => Ok(RenderedExport {
            file_name: format!("export_{code}_{stamp}.csv"),
            content: tabular::render_csv(data)?,
        }),
        ExportFormat::Nsdc => Ok(RenderedExport {
            file_name: format!("nsdc_export_{code}_{stamp}.json"),
            content: serde_json::to_vec_pretty(&nsdc::NsdcExport::new(data))?,
        }),
        ExportFormat::Pmkvy => Ok(RenderedExport {
            file_name: format!("pmkvy_export_{code}_{stamp}.json"),
            content: serde_json::to_vec_pretty(&nsdc::PmkvyExport::new(data))?,
        }),
        ExportFormat::Pdf | ExportFormat::State => Err(RenderError::Unsupported(format)),
    }
}

/// Replace anything outside `[A-Za-z0-9_-]` so a code can sit in a file name.
fn file_safe(code: &str) -> String {
    code.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') { c } else { '_' })
        .collect()
}

/// `YYYY-MM-DD` of a timestamp.
fn day(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}
