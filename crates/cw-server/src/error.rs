//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cw_db::PoolError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the query endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter was absent or empty.
    #[error("missing required query parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] PoolError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "MISSING_PARAMETER",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "rejected request");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_parameter_is_bad_request() {
        let error = ApiError::MissingParameter("classroom");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "MISSING_PARAMETER");
        assert_eq!(
            error.to_string(),
            "missing required query parameter `classroom`"
        );
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let error = ApiError::from(PoolError::Timeout(Duration::from_millis(50)));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code(), "STORAGE_ERROR");
        assert_eq!(error.into_response().status(), 500);
    }
}
