use thiserror::Error;

use triage_auth::error::AuthError;
use triage_core::error::CoreError;
use triage_storage::error::StorageError;

/// Errors surfaced to the caller of a dialogue operation.
///
/// Parse fallbacks are not errors: the parser substitutes a typed default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogueError {
    /// Empty complaint or answer. Nothing but the message changes.
    #[error("{0}")]
    Validation(String),

    /// A model call failed or returned unusable text. The session stays on
    /// its current screen so the same action can be retried.
    #[error("{0}")]
    Generation(String),

    /// The operation does not apply to the session's current state.
    #[error("invalid session state: {0}")]
    InvalidState(String),
}

/// Failures inside the submission adapter. Logged and recovered there,
/// never returned to the dialogue.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("identity unavailable: {0}")]
    Identity(#[from] AuthError),

    #[error("note rejected: {0}")]
    Draft(#[from] CoreError),

    #[error("{store} store write failed: {source}")]
    Store {
        store: String,
        #[source]
        source: StorageError,
    },
}
