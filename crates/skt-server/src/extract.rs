//! Extractors whose rejections use the API envelope, and request metadata
//! for the audit trail.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Query};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::Json;
use serde::Deserialize;
use skt_core::enums::UnknownVariant;
use skt_core::validation::parse_enum_field;
use skt_db::repos::audit::Actor;

use crate::error::ApiError;

/// `Json` that rejects with a 400 envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` that rejects with a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` that rejects with a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// A request body that also names its author. Used for bodies whose own
/// shape has no `created_by`.
#[derive(Debug, Deserialize)]
pub struct Authored<T> {
    #[serde(flatten)]
    pub body: T,
    pub created_by: Option<String>,
}

/// Header naming the caller when the body does not.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity and origin, recorded on audit events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    fn from_headers(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        let forwarded = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()));
        Self {
            user_id: header(USER_ID_HEADER),
            ip_address: forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())),
            user_agent: header("user-agent"),
        }
    }

    /// Actor named by a body field, else `fallback`.
    pub fn actor(&self, named: Option<&str>, fallback: &str) -> Actor {
        Actor::named_or(named, fallback)
            .with_request_meta(self.ip_address.clone(), self.user_agent.clone())
    }

    /// Actor named by the `x-user-id` header, else `fallback`.
    pub fn header_actor(&self, fallback: &str) -> Actor {
        self.actor(self.user_id.as_deref(), fallback)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::from_headers(&parts.headers, peer))
    }
}

/// Parse an optional enum query parameter. Absent, empty, and `all` mean
/// no filter.
pub fn enum_param<T>(field: &str, value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = UnknownVariant>,
{
    match value.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(v) => Ok(Some(parse_enum_field(field, v)?)),
    }
}

/// `None` for an empty or `all` filter value.
pub fn text_param(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "all")
}
