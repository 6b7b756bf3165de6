// Global error handling for HTTP middleware layers and handler errors

use axum::{
    BoxError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::error::Error;
use thiserror::Error;
// tower's error type for timeouts
use tower::timeout::error::Elapsed;
// Axum uses http_body_util for length-limiting
use http_body_util::LengthLimitError;
use tracing::error;

use crate::domain::cycle::ZoneChangeDenied;
use crate::utils::response_handler::HandlerResponse;

/// Maps layer errors to appropriate HTTP responses
pub async fn handle_global_error(err: BoxError) -> impl IntoResponse {
    // 413 if the body was too large
    if err.is::<LengthLimitError>() || find_cause::<LengthLimitError>(&*err).is_some() {
        return StatusCode::PAYLOAD_TOO_LARGE;
    }

    // 408 if the request took too long
    if err.is::<Elapsed>() {
        return StatusCode::REQUEST_TIMEOUT;
    }

    // Otherwise, 500
    error!("Unhandled middleware error: {}", err);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Helper function to find specific error type in error chain
pub fn find_cause<T: Error + 'static>(err: &dyn Error) -> Option<&T> {
    let mut source: Option<&dyn Error> = err.source();

    while let Some(s) = source {
        if let Some(typed) = s.downcast_ref::<T>() {
            return Some(typed);
        }
        source = s.source();
    }

    None
}

/// Result type for services and handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors a request can end in. Rendered through `HandlerResponse`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code placed in `data.error`.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) | ApiError::Database(_) => "internal_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) | ApiError::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ZoneChangeDenied> for ApiError {
    fn from(denied: ZoneChangeDenied) -> Self {
        match denied {
            ZoneChangeDenied::NotOwnZone => ApiError::unauthorized(denied.message()),
            _ => ApiError::forbidden(denied.message()),
        }
    }
}

impl From<ApiError> for HandlerResponse {
    fn from(err: ApiError) -> Self {
        if matches!(err, ApiError::Internal(_) | ApiError::Database(_)) {
            error!("Request failed: {:#}", err);
        }

        HandlerResponse::new(err.status())
            .data(json!({ "error": err.code() }))
            .message(err.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        HandlerResponse::from(self).into_response()
    }
}
