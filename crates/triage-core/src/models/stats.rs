use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::note::StoredNote;

/// Summary counts shown on the review surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NoteStats {
    pub total_notes: usize,
    /// Notes created since the start of the local calendar day of `now`.
    pub today_notes: usize,
    /// Distinct attribution identifiers.
    pub unique_users: usize,
}

impl NoteStats {
    pub fn compute(notes: &[StoredNote], now: &jiff::Zoned) -> Self {
        let day_start = match now.start_of_day() {
            Ok(start) => start.timestamp(),
            Err(_) => now.timestamp(),
        };

        let today_notes = notes
            .iter()
            .filter(|note| note.created_at >= day_start)
            .count();

        let unique_users = notes
            .iter()
            .map(|note| note.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        Self {
            total_notes: notes.len(),
            today_notes,
            unique_users,
        }
    }
}
