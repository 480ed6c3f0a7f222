// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorBody;

/// Per-request failures. Each one ends as a JSON `{ error, details }` body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("upstream rejected the request ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream unreachable: {0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    MalformedUpstreamResponse(String),

    #[error("{0}")]
    InvalidFeedback(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidFeedback(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => *status,
            AppError::UpstreamUnavailable(_)
            | AppError::MalformedUpstreamResponse(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Upstream { .. } => "upstream",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::MalformedUpstreamResponse(_) => "malformed_upstream",
            AppError::InvalidFeedback(_) => "invalid_feedback",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            AppError::BadRequest(details) => ("Invalid request format", details.clone()),
            AppError::Upstream { message, .. } => ("OpenAI API Error", message.clone()),
            AppError::InvalidFeedback(details) => ("Invalid feedback", details.clone()),
            AppError::UpstreamUnavailable(_)
            | AppError::MalformedUpstreamResponse(_)
            | AppError::Internal(_) => ("Internal Server Error", self.to_string()),
        };
        ErrorBody { error: error.to_string(), details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
