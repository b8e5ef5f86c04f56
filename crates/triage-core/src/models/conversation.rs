use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// The fixed prompt that opens every triage session. The patient's chief
/// complaint is recorded as its answer.
pub const OPENING_QUESTION: &str = "What brings you here today?";

/// One question/answer exchange in a triage transcript.
///
/// An empty `answer` marks the question that is currently awaiting a reply.
/// Index 0 of a transcript is always the opening complaint; index `i >= 1`
/// is the `i`-th follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
}

impl ConversationEntry {
    /// The opening entry: the fixed question answered by the complaint.
    pub fn opening(complaint: &str) -> Self {
        Self {
            question: OPENING_QUESTION.to_string(),
            answer: complaint.to_string(),
        }
    }

    /// A freshly issued follow-up question with no answer yet.
    pub fn pending(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: String::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.answer.is_empty()
    }
}

/// Count of follow-up questions (entries after the opening one) that have
/// been answered.
pub fn answered_follow_ups(transcript: &[ConversationEntry]) -> usize {
    transcript
        .iter()
        .skip(1)
        .filter(|entry| !entry.is_pending())
        .count()
}

/// Check the structural invariants of a transcript.
///
/// - entry 0 is the opening question, answered with the complaint
/// - at most one entry is pending, and only as the last entry
pub fn check_transcript(
    complaint: &str,
    transcript: &[ConversationEntry],
) -> Result<(), CoreError> {
    let Some(first) = transcript.first() else {
        return Err(CoreError::InvalidTranscript("transcript is empty".to_string()));
    };

    if first.question != OPENING_QUESTION || first.answer != complaint {
        return Err(CoreError::InvalidTranscript(
            "entry 0 must be the opening complaint".to_string(),
        ));
    }

    let last = transcript.len() - 1;
    if let Some((index, _)) = transcript
        .iter()
        .enumerate()
        .find(|(index, entry)| entry.is_pending() && *index != last)
    {
        return Err(CoreError::InvalidTranscript(format!(
            "entry {index} is unanswered but not last"
        )));
    }

    Ok(())
}
