//! Error handling for the Bookshelf HTTP layer

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::{Timestamp, Uuid};

use bookshelf_db::StoreError;

/// Wire envelope for every error response: `{ "error": { ... } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: ErrorMessage,
    pub status: u16,
}

/// A single message, or one message per violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {}", .messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// One message per violation, in the order they were found
    pub fn validation<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::BadRequest { .. } => "bad_request",
            AppError::NotFound { .. } => "not_found",
            AppError::Conflict { .. } => "conflict",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::not_found(err.to_string()),
            StoreError::Conflict { .. } => AppError::conflict(err.to_string()),
            StoreError::Storage(_) | StoreError::Codec(_) => AppError::Internal(err.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v7(Timestamp::now(uuid::NoContext));
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = code,
                status_code = status.as_u16(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                error_code = code,
                status_code = status.as_u16(),
                error = %self,
                "request rejected"
            );
        }

        let message = match self {
            AppError::Validation { messages } => ErrorMessage::Many(messages),
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Conflict { message } => ErrorMessage::Single(message),
            // Release builds never leak storage internals to clients.
            AppError::Internal(_) if cfg!(not(debug_assertions)) => {
                ErrorMessage::Single("An internal server error occurred".to_string())
            }
            AppError::Internal(err) => ErrorMessage::Single(err.to_string()),
        };

        let body = ErrorEnvelope {
            error: ErrorBody {
                message,
                status: status.as_u16(),
            },
        };

        (status, Json(body)).into_response()
    }
}
