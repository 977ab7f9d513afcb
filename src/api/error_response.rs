//! HTTP error response handling for the API
//!
//! Conversions from domain errors and extractor rejections to HTTP responses
//! with appropriate status codes and JSON error bodies.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors with a known status go through Error::into_response instead
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Missing or malformed query string (e.g. `?id=abc`): 400
pub(crate) fn query_rejection(rejection: QueryRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new("invalid_query", rejection.body_text())),
    )
        .into_response()
}

/// Unusable request body, keeping axum's status: 415 for a missing JSON
/// content type, 400 for broken JSON, 422 for a body of the wrong shape
pub(crate) fn json_rejection(rejection: JsonRejection) -> Response {
    (rejection.status(), Json(ApiError::validation(rejection.body_text()))).into_response()
}
