use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("AWS config error: {0}")]
    Config(String),
}
