//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// Body sent for every failure that is not the client's fault.
const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// API-level error type that maps to HTTP responses.
///
/// Every response body has the shape `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Error raised by the creation pipeline.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Client errors carry their message; everything else is logged here and
/// answered with a generic 500.
fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Unauthorized => (StatusCode::UNAUTHORIZED, err.to_string()),
        _ if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            tracing::error!(error = ?err, kind = err.kind(), "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE.to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
