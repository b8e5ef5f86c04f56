use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use triage_core::models::conversation::ConversationEntry;
use triage_core::models::note::{CompiledNote, NoteDraft, StoredNote};
use triage_storage::error::StorageError;
use triage_storage::local::LocalNoteStore;
use triage_storage::store::{BoxFuture, NoteStore};
use triage_storage::subscribe::subscribe;

const POLL: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

fn draft(complaint: &str) -> NoteDraft {
    NoteDraft {
        user_id: "user-1".to_string(),
        initial_complaint: complaint.to_string(),
        transcript: vec![ConversationEntry::opening(complaint)],
        note: CompiledNote {
            subjective: String::new(),
            objective: String::new(),
            assessment: String::new(),
            plan: String::new(),
        },
    }
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Vec<StoredNote>>) -> Vec<StoredNote> {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("subscription delivered nothing")
        .expect("subscription channel closed")
}

#[tokio::test]
async fn delivers_full_set_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalNoteStore::new(dir.path().join("notes.jsonl")));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = subscribe(store.clone(), POLL, move |notes| {
        let _ = tx.send(notes);
    });

    assert!(next(&mut rx).await.is_empty());

    let first = store.create_note(&draft("rash")).await.unwrap();
    assert_eq!(next(&mut rx).await, vec![first.clone()]);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = store.create_note(&draft("cough")).await.unwrap();
    let ids: Vec<_> = next(&mut rx).await.into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

struct Unreachable;

impl NoteStore for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn create_note<'a>(
        &'a self,
        _draft: &'a NoteDraft,
    ) -> BoxFuture<'a, Result<StoredNote, StorageError>> {
        Box::pin(async { Err(StorageError::PutObject("connection refused".to_string())) })
    }

    fn list_notes(&self) -> BoxFuture<'_, Result<Vec<StoredNote>, StorageError>> {
        Box::pin(async { Err(StorageError::ListObjects("connection refused".to_string())) })
    }
}

#[tokio::test]
async fn read_errors_deliver_empty_set() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = subscribe(Arc::new(Unreachable), POLL, move |notes| {
        let _ = tx.send(notes);
    });

    assert!(next(&mut rx).await.is_empty());
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalNoteStore::new(dir.path().join("notes.jsonl")));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = subscribe(store.clone(), POLL, move |notes| {
        let _ = tx.send(notes);
    });
    assert!(next(&mut rx).await.is_empty());

    subscription.unsubscribe();
    store.create_note(&draft("rash")).await.unwrap();

    // The aborted task drops its sender, closing the channel.
    let closed = tokio::time::timeout(WAIT, rx.recv()).await.unwrap();
    assert!(closed.is_none());
}
