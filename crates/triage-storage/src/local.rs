//! Local fallback note store.
//!
//! Notes are appended as JSON lines to a single file. Appends are
//! serialized through a mutex, so one store instance may be shared by
//! concurrent sessions; separate processes must not share a file.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use triage_core::models::note::{NoteDraft, StoredNote, sort_newest_first};

use crate::error::StorageError;
use crate::store::{BoxFuture, NoteStore, require_attribution};

pub struct LocalNoteStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalNoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, draft: &NoteDraft) -> Result<StoredNote, StorageError> {
        require_attribution(draft)?;

        let note = StoredNote::from_draft(
            draft.clone(),
            format!("local-{}", Uuid::new_v4()),
            jiff::Timestamp::now(),
        );
        let mut line = serde_json::to_vec(&note)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        info!(note_id = %note.id, path = %self.path.display(), "note stored locally");
        Ok(note)
    }

    async fn read_all(&self) -> Result<Vec<StoredNote>, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut notes = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredNote>(line) {
                Ok(note) => notes.push(note),
                Err(e) => warn!(line = number + 1, error = %e, "skipping unreadable local note"),
            }
        }

        sort_newest_first(&mut notes);
        Ok(notes)
    }
}

impl NoteStore for LocalNoteStore {
    fn name(&self) -> &str {
        "local"
    }

    fn create_note<'a>(
        &'a self,
        draft: &'a NoteDraft,
    ) -> BoxFuture<'a, Result<StoredNote, StorageError>> {
        Box::pin(self.append(draft))
    }

    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<StoredNote>, StorageError>> {
        Box::pin(self.read_all())
    }
}
