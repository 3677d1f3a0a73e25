//! The `{success, data, error, pagination, message}` response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use skt_core::responses::{Page, Pagination};

/// JSON body of every `/api` response. Unset fields are omitted.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub const fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            pagination: None,
            message: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            pagination: None,
            message: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A successful envelope with its status code.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    body: Envelope<T>,
}

impl<T> ApiResponse<T> {
    /// 200 with `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope::data(data),
        }
    }

    /// 201 with `data`.
    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: Envelope::data(data),
        }
    }

    /// 202 with `data`; the work continues in the background.
    pub const fn accepted(data: T) -> Self {
        Self {
            status: StatusCode::ACCEPTED,
            body: Envelope::data(data),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// 200 with the page's items as `data` and its position as `pagination`.
    pub fn page(page: Page<T>) -> Self {
        let mut body = Envelope::data(page.items);
        body.pagination = Some(page.pagination);
        Self {
            status: StatusCode::OK,
            body,
        }
    }
}

impl ApiResponse<()> {
    /// 200 with only a `message`.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Envelope {
                success: true,
                data: None,
                error: None,
                pagination: None,
                message: Some(message.into()),
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}
