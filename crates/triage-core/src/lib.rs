//! triage-core
//!
//! Pure domain types for the intake dialogue, compiled notes, and store key
//! conventions. No AWS SDK dependency; this is the shared vocabulary of the
//! triage system.

pub mod display;
pub mod error;
pub mod models;
pub mod store_keys;
