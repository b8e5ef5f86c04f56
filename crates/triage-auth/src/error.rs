use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("no sign-in method configured")]
    NotConfigured,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("Cognito error: {0}")]
    Cognito(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
