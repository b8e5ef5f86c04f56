//! Note submission adapter.
//!
//! Packages a finished session for storage with a two-tier write: the
//! durable store first, then the local fallback store. Submission never
//! fails from the dialogue's point of view; the returned receipt says which
//! tier took the note.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use triage_auth::identity::IdentityProvider;
use triage_core::models::conversation::ConversationEntry;
use triage_core::models::note::{CompiledNote, NoteDraft, StoredNote};
use triage_storage::store::NoteStore;

use crate::error::SubmissionError;

/// Which tier ended up holding the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTier {
    Durable,
    Local,
    /// Both tiers refused the write. The receipt id is synthesized and the
    /// note exists only in the session.
    Unsaved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub note_id: String,
    pub tier: StoreTier,
    pub user_id: String,
    /// Why the durable tier was skipped, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// A completed session, as handed over by the dialogue.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub session_id: Uuid,
    pub complaint: String,
    pub transcript: Vec<ConversationEntry>,
    pub note: CompiledNote,
}

/// Attribution id used when no identity can be established. Scoped to the
/// session it attributes.
pub fn demo_user_id(session_id: Uuid) -> String {
    format!("demo-user-{}", session_id.simple())
}

#[derive(Clone)]
pub struct NoteSubmitter {
    primary: Arc<dyn NoteStore>,
    fallback: Arc<dyn NoteStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl NoteSubmitter {
    pub fn new(
        primary: Arc<dyn NoteStore>,
        fallback: Arc<dyn NoteStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            primary,
            fallback,
            identity,
        }
    }

    /// The same stores with a different attribution source.
    pub fn with_identity(&self, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            primary: Arc::clone(&self.primary),
            fallback: Arc::clone(&self.fallback),
            identity,
        }
    }

    pub async fn submit(&self, request: SubmissionRequest) -> SubmissionReceipt {
        let session_id = request.session_id;
        let user_id = self.resolve_identity(session_id).await;

        let draft = match NoteDraft::new(
            user_id.clone(),
            request.complaint,
            request.transcript,
            request.note,
        ) {
            Ok(draft) => draft,
            Err(e) => {
                let e = SubmissionError::from(e);
                error!(session_id = %session_id, error = %e, "note could not be packaged");
                return unsaved(user_id, e);
            }
        };

        let reason = match write(self.primary.as_ref(), &draft).await {
            Ok(stored) => {
                info!(session_id = %session_id, note_id = %stored.id, tier = "durable", "note submitted");
                return SubmissionReceipt {
                    note_id: stored.id,
                    tier: StoreTier::Durable,
                    user_id,
                    fallback_reason: None,
                };
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "durable write failed, using local store");
                e.to_string()
            }
        };

        match write(self.fallback.as_ref(), &draft).await {
            Ok(stored) => {
                info!(session_id = %session_id, note_id = %stored.id, tier = "local", "note submitted");
                SubmissionReceipt {
                    note_id: stored.id,
                    tier: StoreTier::Local,
                    user_id,
                    fallback_reason: Some(reason),
                }
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "local write failed, note not persisted");
                unsaved(user_id, e)
            }
        }
    }

    async fn resolve_identity(&self, session_id: Uuid) -> String {
        if let Some(id) = self.identity.current_identity().await.filter(|id| !id.is_empty()) {
            return id;
        }

        match self.identity.establish_identity().await {
            Ok(id) if !id.is_empty() => id,
            Ok(_) => demo_user_id(session_id),
            Err(e) => {
                let e = SubmissionError::from(e);
                warn!(session_id = %session_id, error = %e, "using demo identity");
                demo_user_id(session_id)
            }
        }
    }
}

async fn write(store: &dyn NoteStore, draft: &NoteDraft) -> Result<StoredNote, SubmissionError> {
    store
        .create_note(draft)
        .await
        .map_err(|source| SubmissionError::Store {
            store: store.name().to_string(),
            source,
        })
}

fn unsaved(user_id: String, reason: SubmissionError) -> SubmissionReceipt {
    SubmissionReceipt {
        note_id: format!("unsaved-{}", Uuid::new_v4()),
        tier: StoreTier::Unsaved,
        user_id,
        fallback_reason: Some(reason.to_string()),
    }
}
