use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use triage_bedrock::error::BedrockError;
use triage_dialogue::error::DialogueError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// The session is mid-call or not in a state that accepts the request.
    Conflict(String),
    /// The model could not be reached or returned unusable text.
    Unavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<DialogueError> for ApiError {
    fn from(e: DialogueError) -> Self {
        match e {
            DialogueError::Validation(msg) => ApiError::BadRequest(msg),
            DialogueError::InvalidState(msg) => ApiError::Conflict(msg),
            DialogueError::Generation(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl From<BedrockError> for ApiError {
    fn from(e: BedrockError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
