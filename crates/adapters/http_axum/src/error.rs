//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use homeguard_domain::error::HomeGuardError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`HomeGuardError`] and malformed request bodies to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Domain(HomeGuardError),
    BadRequest(String),
}

impl From<HomeGuardError> for ApiError {
    fn from(err: HomeGuardError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Domain(HomeGuardError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(HomeGuardError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(HomeGuardError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
