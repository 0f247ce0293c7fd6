use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use ecomentor_engine::{EngineError, ValidationError};
use ecomentor_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{1}")]
    Status(StatusCode, String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Status(code, message.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", e))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("spawn_blocking join error: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Engine(EngineError::UserNotFound(_)) => {
                (StatusCode::NOT_FOUND, "User not found".to_string())
            }
            Self::Engine(e @ EngineError::NoAssignment) => (StatusCode::CONFLICT, e.to_string()),
            Self::Engine(e @ (EngineError::NoOptional | EngineError::ChallengeMissing(_))) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            Self::Engine(EngineError::Store(e)) => {
                error!("Record store failure: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
            Self::Status(code, message) => (code, message),
            Self::Internal(message) => {
                error!("{}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
