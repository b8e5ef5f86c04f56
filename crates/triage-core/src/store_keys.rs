//! Note store key conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the layout
//! of note objects in the durable store's bucket.

use uuid::Uuid;

/// Collection prefix used when no application id is configured.
pub const DEFAULT_NOTES_PREFIX: &str = "notes/default/";

/// Collection prefix for one application's notes.
pub fn notes_prefix(app_id: &str) -> String {
    format!("notes/{app_id}/")
}

pub fn note(prefix: &str, id: Uuid) -> String {
    format!("{prefix}{id}.json")
}
