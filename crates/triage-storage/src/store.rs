use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use triage_core::models::note::{NoteDraft, StoredNote};

use crate::error::StorageError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A write-once collection of compiled notes.
///
/// Stores assign each note its `id` and `created_at`; notes are never
/// updated or deleted. Methods return boxed futures for dyn compatibility.
pub trait NoteStore: Send + Sync {
    /// A short label for logs (e.g. `"s3"`, `"local"`).
    fn name(&self) -> &str;

    /// Persist a draft, returning the stored record with its assigned
    /// identity. Fails with `StorageError::Unattributed` when the draft has
    /// no user id.
    fn create_note<'a>(
        &'a self,
        draft: &'a NoteDraft,
    ) -> BoxFuture<'a, Result<StoredNote, StorageError>>;

    /// The full current note set, newest first.
    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<StoredNote>, StorageError>>;
}

impl<T: NoteStore + ?Sized> NoteStore for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn create_note<'a>(
        &'a self,
        draft: &'a NoteDraft,
    ) -> BoxFuture<'a, Result<StoredNote, StorageError>> {
        (**self).create_note(draft)
    }

    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<StoredNote>, StorageError>> {
        (**self).list_notes()
    }
}

pub(crate) fn require_attribution(draft: &NoteDraft) -> Result<(), StorageError> {
    if draft.user_id.trim().is_empty() {
        return Err(StorageError::Unattributed);
    }
    Ok(())
}
