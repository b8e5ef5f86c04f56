//! triage-storage
//!
//! Note persistence: S3 object helpers, the [`store::NoteStore`] seam, the
//! S3-backed durable store, the local fallback store, and a polling
//! subscription over a store's note set.

pub mod client;
pub mod error;
pub mod json;
pub mod local;
pub mod objects;
pub mod s3;
pub mod store;
pub mod subscribe;
