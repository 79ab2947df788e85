//! HTTP error mapping for API handlers.

use crate::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lexicard_core::models::api::ErrorBody;

/// Wrapper that turns store errors into JSON error responses.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl HttpError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match &self.0 {
            AppError::InvalidName(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid file name".to_string(),
                    details: None,
                },
            ),
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message.clone(),
                    details: None,
                },
            ),
            AppError::NotFound(name) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "File not found".to_string(),
                    details: Some(name.clone()),
                },
            ),
            AppError::Corrupt { reason, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: "Failed to read file".to_string(),
                    details: Some(reason.clone()),
                },
            ),
            AppError::StorageUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "Storage unavailable".to_string(),
                    details: Some(message.clone()),
                },
            ),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        (status, Json(body)).into_response()
    }
}
