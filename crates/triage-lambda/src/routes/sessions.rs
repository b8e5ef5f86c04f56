use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use triage_core::models::conversation::ConversationEntry;
use triage_dialogue::error::DialogueError;
use triage_dialogue::session::{Progress, SessionState, TriageSession};
use triage_dialogue::submission::SubmissionReceipt;

use crate::error::ApiError;
use crate::middleware::auth::Caller;
use crate::state::AppState;

/// What the client renders after every session call.
#[derive(Serialize)]
pub struct SessionView {
    pub id: Uuid,
    #[serde(flatten)]
    pub state: SessionState,
    pub pending_question: Option<String>,
    pub progress: Progress,
    pub answered: Vec<ConversationEntry>,
    /// Set once, on the call that completed the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
}

impl SessionView {
    fn of(session: &TriageSession) -> Self {
        Self {
            id: session.id(),
            state: session.state().clone(),
            pending_question: session.pending_question().map(str::to_string),
            progress: session.progress(),
            answered: session.answered_transcript().into_iter().cloned().collect(),
            receipt: None,
        }
    }
}

#[derive(Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub complaint: String,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub answer: String,
}

pub async fn create_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> (StatusCode, Json<SessionView>) {
    let handle = state.open_session(caller.sub).await;
    let session = handle.lock().await;
    (StatusCode::CREATED, Json(SessionView::of(&session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.lock_session(id).await?;
    Ok(Json(SessionView::of(&session)))
}

pub async fn start_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StartRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.lock_session(id).await?;
    let result = session.start(&req.complaint).await;
    respond(&session, result)?;
    Ok(Json(SessionView::of(&session)))
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.lock_session(id).await?;
    let result = session.submit_answer(&req.answer).await;
    respond(&session, result)?;

    // The runtime may freeze once the response is sent, so the write is
    // awaited here rather than left in the background.
    let receipt = match session.take_submission() {
        Some(handle) => match handle.await {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                error!(session_id = %id, error = %e, "note submission task failed");
                None
            }
        },
        None => None,
    };

    Ok(Json(SessionView {
        receipt,
        ..SessionView::of(&session)
    }))
}

pub async fn retry_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.lock_session(id).await?;
    let result = session.retry_question().await;
    respond(&session, result)?;
    Ok(Json(SessionView::of(&session)))
}

pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let mut session = state.lock_session(id).await?;
    let notice = session.reset();

    let mut view = SessionView::of(&session);
    view.state.notice = Some(notice.to_string());
    Ok(Json(view))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    // A busy session cannot be deleted from under its call.
    drop(state.lock_session(id).await?);
    state.remove_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Map a dialogue failure to a response. Generation failures report the
/// session's user-facing message; the detail only goes to the log.
fn respond(session: &TriageSession, result: Result<(), DialogueError>) -> Result<(), ApiError> {
    match result {
        Ok(()) => Ok(()),
        Err(DialogueError::Generation(detail)) => {
            warn!(session_id = %session.id(), error = %detail, "generation failed");
            let message = session
                .state()
                .last_error
                .clone()
                .unwrap_or_else(|| "generation failed".to_string());
            Err(ApiError::Unavailable(message))
        }
        Err(other) => Err(other.into()),
    }
}
