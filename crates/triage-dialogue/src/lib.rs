//! triage-dialogue
//!
//! The intake dialogue controller: a per-session state machine that asks
//! model-generated follow-up questions until the sufficiency policy says to
//! stop, compiles the transcript into a note, and hands the result to the
//! note submission adapter.

pub mod error;
pub mod policy;
pub mod session;
pub mod submission;
