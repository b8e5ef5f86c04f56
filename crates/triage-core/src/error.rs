use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid transcript: {0}")]
    InvalidTranscript(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}
