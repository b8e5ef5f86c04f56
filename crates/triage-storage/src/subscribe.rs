//! Live view of a store's note set.
//!
//! Neither store pushes changes, so the subscription polls. The callback
//! receives the full note set (never deltas), newest first, whenever the
//! set changes. A failed read is delivered as an empty set.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use triage_core::models::note::{StoredNote, sort_newest_first};

use crate::store::NoteStore;

/// Handle to a running subscription. Dropping it stops delivery.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Poll `store` every `interval`, invoking `on_notes` with the current set
/// on the first poll and after every change.
///
/// Must be called from within a Tokio runtime.
pub fn subscribe<F>(store: Arc<dyn NoteStore>, interval: Duration, mut on_notes: F) -> Subscription
where
    F: FnMut(Vec<StoredNote>) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Notes are write-once, so the id sequence identifies the set.
        let mut last_ids: Option<Vec<String>> = None;

        loop {
            ticker.tick().await;

            let notes = match store.list_notes().await {
                Ok(mut notes) => {
                    sort_newest_first(&mut notes);
                    notes
                }
                Err(e) => {
                    warn!(store = store.name(), error = %e, "note subscription read failed");
                    Vec::new()
                }
            };

            let ids: Vec<String> = notes.iter().map(|n| n.id.clone()).collect();
            if last_ids.as_ref() == Some(&ids) {
                continue;
            }

            debug!(store = store.name(), count = ids.len(), "note set changed");
            last_ids = Some(ids);
            on_notes(notes);
        }
    });

    Subscription { handle }
}
