use axum::Json;
use axum::extract::{Path, State};
use jiff::Timestamp;
use serde::Serialize;

use triage_core::display::display_timestamp;
use triage_core::models::note::StoredNote;
use triage_core::models::stats::NoteStats;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NoteView {
    #[serde(flatten)]
    pub note: StoredNote,
    /// `created_at` formatted for the review list.
    pub display_time: String,
}

/// All stored notes, newest first.
pub async fn list_notes(State(state): State<AppState>) -> Json<Vec<NoteView>> {
    let now = Timestamp::now();
    let notes = state.notes.borrow().clone();

    Json(
        notes
            .into_iter()
            .map(|note| view(note, now, &state))
            .collect(),
    )
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NoteView>, ApiError> {
    let note = state
        .notes
        .borrow()
        .iter()
        .find(|note| note.id == id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("note not found: {id}")))?;

    Ok(Json(view(note, Timestamp::now(), &state)))
}

pub async fn note_stats(State(state): State<AppState>) -> Json<NoteStats> {
    let now = Timestamp::now().to_zoned(state.display_tz.clone());
    let stats = NoteStats::compute(&state.notes.borrow(), &now);
    Json(stats)
}

fn view(note: StoredNote, now: Timestamp, state: &AppState) -> NoteView {
    NoteView {
        display_time: display_timestamp(note.created_at, now, &state.display_tz),
        note,
    }
}
