//! Traced GET handler.
//!
//! Per request:
//! ```text
//! Idle → TransactionOpen → SegmentOpen → SegmentClosed → TransactionClosed
//! ```
//! `SegmentClosed` is reached on every path, including a failing or
//! panicking body builder, because the segment is a drop guard.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::apm::{Agent, TransactionCategory};
use crate::http::path::{normalize_request_path, PathError};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Transaction name for every handled request.
pub const TRANSACTION_NAME: &str = "HTTP_GET";

/// Segment wrapped around response generation.
pub const SEGMENT_NAME: &str = "ProcessRequest";

const X_REQUEST_ID: &str = "x-request-id";

/// The parts of a request the handler looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub request_id: Option<String>,
}

impl RequestInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            request_id: None,
        }
    }

    /// Build from request parts. The path is decoded and normalized.
    pub fn from_parts(method: Method, uri: &Uri, headers: &HeaderMap) -> Result<Self, PathError> {
        Ok(Self {
            method,
            path: normalize_request_path(uri.path())?,
            request_id: headers
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }
}

/// Failure while producing a response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("bad request path: {0}")]
    BadPath(#[from] PathError),

    #[error("failed to build response body: {0}")]
    Body(String),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadPath(_) => StatusCode::BAD_REQUEST,
            HandlerError::Body(_) | HandlerError::Response(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request handling failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, [(header::CONTENT_TYPE, "text/plain")], reason).into_response()
    }
}

/// Default body builder: echoes the requested path.
pub fn greeting(request: &RequestInfo) -> Result<String, HandlerError> {
    Ok(format!("Hello, world! You requested: {}", request.path))
}

/// Produce the response for `request` inside a transaction and segment.
///
/// `build_body` runs while the segment is open. Its error is noticed on the
/// segment and the transaction and returned unchanged.
pub fn handle_traced<F>(
    agent: &Agent,
    request: &RequestInfo,
    build_body: F,
) -> Result<Response, HandlerError>
where
    F: FnOnce(&RequestInfo) -> Result<String, HandlerError>,
{
    let mut transaction = agent.start_transaction(TRANSACTION_NAME, TransactionCategory::Web);
    transaction.add_custom_attribute("endpoint", &request.path);
    if let Some(request_id) = &request.request_id {
        transaction.add_custom_attribute("request_id", request_id);
    }

    let mut segment = transaction.start_segment(SEGMENT_NAME);
    segment.add_custom_attributes([
        ("method", request.method.as_str()),
        ("path", request.path.as_str()),
    ]);

    let result = build_body(request).and_then(|body| {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(body))
            .map_err(HandlerError::from)
    });

    if let Err(err) = &result {
        segment.notice_error(err);
    }
    segment.finish();

    if let Err(err) = &result {
        transaction.notice_error(err);
    }
    result
}

/// Axum entry point for `GET /` and `GET /{*path}`.
pub async fn traced_get(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    let start = Instant::now();
    let request = match RequestInfo::from_parts(method.clone(), &uri, &headers) {
        Ok(request) => request,
        Err(e) => {
            metrics::record_request(method.as_str(), StatusCode::BAD_REQUEST.as_u16(), start);
            return Err(e.into());
        }
    };

    tracing::debug!(
        method = %request.method,
        path = %request.path,
        request_id = request.request_id.as_deref(),
        "Handling request"
    );

    let result = handle_traced(&state.agent, &request, greeting);

    let status = match &result {
        Ok(response) => response.status().as_u16(),
        Err(e) => e.status().as_u16(),
    };
    metrics::record_request(request.method.as_str(), status, start);

    result
}
