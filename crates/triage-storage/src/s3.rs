//! The durable note store: one JSON object per note under a collection
//! prefix in S3.

use aws_sdk_s3::Client;
use tracing::{info, warn};
use uuid::Uuid;

use triage_core::models::note::{NoteDraft, StoredNote, sort_newest_first};
use triage_core::store_keys;

use crate::error::StorageError;
use crate::json;
use crate::objects;
use crate::store::{BoxFuture, NoteStore, require_attribution};

pub struct S3NoteStore {
    s3: Client,
    bucket: String,
    prefix: String,
}

impl S3NoteStore {
    pub fn new(s3: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    async fn create(&self, draft: &NoteDraft) -> Result<StoredNote, StorageError> {
        require_attribution(draft)?;

        let id = Uuid::new_v4();
        let key = store_keys::note(&self.prefix, id);
        let note = StoredNote::from_draft(draft.clone(), id.to_string(), jiff::Timestamp::now());

        json::create_json(&self.s3, &self.bucket, &key, &note).await?;

        info!(note_id = %id, bucket = %self.bucket, key = %key, "note stored");
        Ok(note)
    }

    async fn list(&self) -> Result<Vec<StoredNote>, StorageError> {
        let keys = objects::list_objects(&self.s3, &self.bucket, &self.prefix).await?;

        let mut notes = Vec::with_capacity(keys.len());
        for key in keys.iter().filter(|k| k.ends_with(".json")) {
            match json::load_json::<StoredNote>(&self.s3, &self.bucket, key).await {
                Ok(note) => notes.push(note),
                Err(StorageError::Serialization(e)) => {
                    warn!(key = %key, error = %e, "skipping unreadable note");
                }
                Err(e) => return Err(e),
            }
        }

        sort_newest_first(&mut notes);
        Ok(notes)
    }
}

impl NoteStore for S3NoteStore {
    fn name(&self) -> &str {
        "s3"
    }

    fn create_note<'a>(
        &'a self,
        draft: &'a NoteDraft,
    ) -> BoxFuture<'a, Result<StoredNote, StorageError>> {
        Box::pin(self.create(draft))
    }

    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<StoredNote>, StorageError>> {
        Box::pin(self.list())
    }
}
