//! HTTP-facing error wrapper for route handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use ecourts_common::RelayError;

/// Handler error: a [`RelayError`] plus an optional `details` string for
/// the case endpoint's `{error, details}` failure shape.
pub struct ApiError {
    inner: RelayError,
    details: Option<&'static str>,
}

impl ApiError {
    pub fn with_details(mut self, details: &'static str) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<RelayError> for ApiError {
    fn from(inner: RelayError) -> Self {
        Self { inner, details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match self.details {
            Some(details) => json!({ "error": self.inner.to_string(), "details": details }),
            None => json!({ "error": self.inner.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
