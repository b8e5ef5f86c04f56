//! triage-bedrock
//!
//! Text generation via Bedrock, prompt rendering for the intake dialogue,
//! and tolerant parsing of the model's replies.

pub mod client;
pub mod error;
pub mod generator;
pub mod parse;
pub mod prompts;
