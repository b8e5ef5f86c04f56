use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::conversation::ConversationEntry;
use crate::error::CoreError;

/// Fixed Objective section. The intake dialogue gathers no exam data, so
/// this text is the Objective content of every compiled note.
pub const OBJECTIVE_DISCLAIMER: &str = "No objective data collected by this application. \
Physical examination and vital signs should be obtained during clinical assessment.";

/// Plan used when the model's reply yields no plan but the transcript is known.
pub const PLAN_FALLBACK: &str = "Recommend physician evaluation to review the reported \
symptoms and determine appropriate next steps.";

/// A four-section (SOAP) clinical note compiled from a triage transcript.
///
/// Created at most once per session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompiledNote {
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
}

/// A finished session packaged for a note store, before the store assigns
/// an identity and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub user_id: String,
    pub initial_complaint: String,
    pub transcript: Vec<ConversationEntry>,
    pub note: CompiledNote,
}

impl NoteDraft {
    /// Package a completed session. Every transcript entry must be answered.
    pub fn new(
        user_id: impl Into<String>,
        initial_complaint: impl Into<String>,
        transcript: Vec<ConversationEntry>,
        note: CompiledNote,
    ) -> Result<Self, CoreError> {
        if transcript.is_empty() {
            return Err(CoreError::MissingField("transcript".to_string()));
        }
        if let Some(index) = transcript.iter().position(ConversationEntry::is_pending) {
            return Err(CoreError::InvalidTranscript(format!(
                "entry {index} has no answer"
            )));
        }

        Ok(Self {
            user_id: user_id.into(),
            initial_complaint: initial_complaint.into(),
            transcript,
            note,
        })
    }
}

/// A note as persisted by a store. `id` and `created_at` are assigned by the
/// store, never by the dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoredNote {
    pub id: String,
    pub user_id: String,
    pub initial_complaint: String,
    pub transcript: Vec<ConversationEntry>,
    pub note: CompiledNote,
    pub created_at: jiff::Timestamp,
}

impl StoredNote {
    pub fn from_draft(draft: NoteDraft, id: impl Into<String>, created_at: jiff::Timestamp) -> Self {
        Self {
            id: id.into(),
            user_id: draft.user_id,
            initial_complaint: draft.initial_complaint,
            transcript: draft.transcript,
            note: draft.note,
            created_at,
        }
    }
}

/// Order notes newest first by creation time.
pub fn sort_newest_first(notes: &mut [StoredNote]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
