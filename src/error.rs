// HTTP API error type: problem-details bodies with one status per service
// error kind
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::services::ServiceError;

#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error, details only in the server log
    Unexpected { error_id: Uuid },
}

/// Response body for every error
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    pub status: u16,
    pub title: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub detail: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_problem(&self) -> ProblemDetails {
        let (title, kind, detail) = match self {
            ApiError::Validation(msg) => ("Bad request", "Validation", msg.clone()),
            ApiError::Unauthorized(msg) => ("Unauthorized", "Unauthorized", msg.clone()),
            ApiError::NotFound(msg) => ("Not Found", "NotFound", msg.clone()),
            ApiError::Unexpected { error_id } => (
                "An unexpected error occurred",
                "Unexpected",
                format!(
                    "An unexpected error occurred. This error has been logged with an error id of {}",
                    error_id
                ),
            ),
        };

        ProblemDetails {
            status: self.status_code().as_u16(),
            title,
            kind,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_problem())).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                ApiError::Validation(msg)
            }
            ServiceError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized request: {}", msg);
                ApiError::Unauthorized(msg)
            }
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Unexpected(msg) => {
                let error_id = Uuid::new_v4();
                tracing::error!(%error_id, "An error occurred at {} UTC: {}", chrono::Utc::now(), msg);
                ApiError::Unexpected { error_id }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
