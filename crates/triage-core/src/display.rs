//! Human-facing formatting for note timestamps.

use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};

/// Format a note's creation time for the review list.
///
/// Notes from the last 24 hours show only the clock time (`3:05 PM`);
/// older notes also show the month and day (`Oct 4, 3:05 PM`).
pub fn display_timestamp(created_at: Timestamp, now: Timestamp, tz: &TimeZone) -> String {
    let zoned = created_at.to_zoned(tz.clone());
    if now.duration_since(created_at) < SignedDuration::from_hours(24) {
        zoned.strftime("%-I:%M %p").to_string()
    } else {
        zoned.strftime("%b %-d, %-I:%M %p").to_string()
    }
}
