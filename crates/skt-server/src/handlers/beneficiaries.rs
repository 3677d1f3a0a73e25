//! Beneficiary endpoints: enrolment, listing, status, progress, placement,
//! and CSV import.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use serde::Deserialize;
use skt_core::entities::{Beneficiary, PlacementRecord, ProgressRecord};
use skt_core::responses::{BeneficiaryDetail, ImportReport};
use skt_core::validation::{
    BeneficiaryRequest, PlacementRequest, ProgressRequest, StatusChangeRequest,
};
use skt_db::repos::audit::SYSTEM_ACTOR;
use skt_db::repos::beneficiary::BeneficiaryFilter;

use crate::error::{ApiError, ApiResult};
use crate::extract::{enum_param, text_param, ApiJson, ApiPath, ApiQuery, RequestMeta};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Room for multipart boundaries and the text fields around the file.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Request bodies up to this many times the CSV cap are read to the end
/// and answered with [`FILE_TOO_LARGE`]; larger ones are cut off by the
/// router's body limit, which maps to the same message.
pub const OVERSIZE_DRAIN_FACTOR: usize = 2;

pub const FILE_TOO_LARGE: &str = "File too large";

#[derive(Debug, Default, Deserialize)]
pub struct BeneficiaryListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn create_beneficiary(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiJson(request): ApiJson<BeneficiaryRequest>,
) -> ApiResult<ApiResponse<Beneficiary>> {
    let (programme_id, new, created_by) = request.validate()?;
    let actor = meta.actor(created_by.as_deref(), SYSTEM_ACTOR);
    let beneficiary = state
        .svc
        .create_beneficiary(&programme_id, new, &actor)
        .await?;
    Ok(ApiResponse::created(beneficiary))
}

pub async fn list_beneficiaries(
    State(state): State<AppState>,
    ApiPath(programme_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<BeneficiaryListQuery>,
) -> ApiResult<ApiResponse<Vec<BeneficiaryDetail>>> {
    let filter = BeneficiaryFilter {
        status: enum_param("status", query.status.as_deref())?,
        q: text_param(query.q),
    };
    let page = state.page(query.page, query.limit, None);
    let beneficiaries = state
        .svc
        .list_beneficiaries(&programme_id, &filter, page)
        .await?;
    Ok(ApiResponse::page(beneficiaries))
}

pub async fn get_beneficiary(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<ApiResponse<BeneficiaryDetail>> {
    Ok(ApiResponse::ok(state.svc.get_beneficiary(&id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<StatusChangeRequest>,
) -> ApiResult<ApiResponse<Beneficiary>> {
    let (status, updated_by) = request.validate()?;
    let actor = meta.actor(updated_by.as_deref(), SYSTEM_ACTOR);
    let beneficiary = state
        .svc
        .update_beneficiary_status(&id, status, &actor)
        .await?;
    Ok(ApiResponse::ok(beneficiary))
}

pub async fn update_progress(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<ProgressRequest>,
) -> ApiResult<ApiResponse<ProgressRecord>> {
    let (update, updated_by) = request.validate()?;
    let actor = meta.actor(updated_by.as_deref(), SYSTEM_ACTOR);
    let record = state.svc.update_progress(&id, update, &actor).await?;
    Ok(ApiResponse::ok(record))
}

pub async fn add_placement(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<PlacementRequest>,
) -> ApiResult<ApiResponse<PlacementRecord>> {
    let (new, created_by) = request.validate()?;
    let actor = meta.actor(created_by.as_deref(), SYSTEM_ACTOR);
    let placement = state.svc.add_placement(&id, new, &actor).await?;
    Ok(ApiResponse::ok(placement))
}

/// An uploaded CSV file.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

fn is_csv(filename: &str, content_type: Option<&str>) -> bool {
    content_type == Some("text/csv")
        || filename
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
}

/// `POST /api/beneficiaries/import/{programme_id}`: multipart with a `file`
/// part and an optional `created_by` text part.
pub async fn import_csv(
    State(state): State<AppState>,
    meta: RequestMeta,
    ApiPath(programme_id): ApiPath<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<ImportReport>> {
    let mut multipart = multipart?;
    let cap = state.config.uploads.max_csv_bytes;
    let mut upload = None;
    let mut created_by = None;
    let mut rejection: Option<&'static str> = None;

    // The body is read to the end before replying, even once rejected.
    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if rejection.is_none() => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if !is_csv(&filename, field.content_type()) {
                    rejection = Some("Only CSV files are allowed");
                    continue;
                }
                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if rejection.is_some() {
                        continue;
                    }
                    if bytes.len() + chunk.len() > cap {
                        rejection = Some(FILE_TOO_LARGE);
                        bytes = Vec::new();
                        continue;
                    }
                    bytes.extend_from_slice(&chunk);
                }
                if rejection.is_none() {
                    upload = Some(Upload { filename, bytes });
                }
            }
            Some("created_by") => created_by = Some(field.text().await?),
            _ => {}
        }
    }

    if let Some(message) = rejection {
        return Err(ApiError::BadRequest(message.into()));
    }
    let upload = upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;
    let actor = meta.actor(created_by.as_deref().map(str::trim), SYSTEM_ACTOR);
    let report = state
        .svc
        .import_beneficiaries_csv(&programme_id, &upload.bytes, &upload.filename, &actor)
        .await?;
    Ok(ApiResponse::ok(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_detection() {
        assert!(is_csv("learners.csv", None));
        assert!(is_csv("LEARNERS.CSV", Some("application/octet-stream")));
        assert!(is_csv("export", Some("text/csv")));
        assert!(!is_csv("learners.xlsx", Some("application/vnd.ms-excel")));
        assert!(!is_csv("", None));
    }
}
