use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Content IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid story content: {0}")]
    InvalidContent(String),

    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Event already playing: {0}")]
    EventInProgress(String),

    #[error("No event is currently playing")]
    NoEventPlaying,

    #[error("Session limit reached ({0} active sessions)")]
    SessionLimitReached(usize),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match &self {
            AppError::SceneNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string(), "SCENE_NOT_FOUND")
            }
            AppError::CharacterNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string(), "CHARACTER_NOT_FOUND")
            }
            AppError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string(), "SESSION_NOT_FOUND")
            }
            AppError::EventInProgress(_) => {
                (StatusCode::CONFLICT, self.to_string(), "EVENT_IN_PROGRESS")
            }
            AppError::NoEventPlaying => {
                (StatusCode::CONFLICT, self.to_string(), "NO_EVENT_PLAYING")
            }
            AppError::SessionLimitReached(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string(), "SESSION_LIMIT")
            }
            AppError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string(), "INVALID_REQUEST")
            }
            AppError::Io(e) => {
                tracing::error!("Content IO error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Content error occurred".to_string(),
                    "CONTENT_ERROR",
                )
            }
            AppError::InvalidContent(e) => {
                tracing::error!("Invalid story content: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Content error occurred".to_string(),
                    "CONTENT_ERROR",
                )
            }
            _ => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = json!({
            "error": error_code,
            "message": error_message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for AppResult
pub type AppResult<T> = Result<T, AppError>;
