use serde::{Deserialize, Serialize};

/// Answered follow-ups below which the fallback decision keeps asking.
pub const FALLBACK_DECISION_THRESHOLD: usize = 4;

pub const FALLBACK_REASONING: &str = "parse failure, using fallback";
pub const FALLBACK_FOCUS: &str = "general clinical details";

/// Whether the model judges that more questioning is needed.
///
/// Ephemeral: consumed immediately by the dialogue to pick its next step,
/// never persisted. Field names match the JSON keys the continuation
/// prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationDecision {
    pub needs_more_info: bool,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_focus: Option<String>,
}

impl ContinuationDecision {
    /// The deterministic decision substituted when the model's reply does
    /// not decode.
    pub fn fallback(answered_follow_ups: usize) -> Self {
        Self {
            needs_more_info: answered_follow_ups < FALLBACK_DECISION_THRESHOLD,
            reasoning: FALLBACK_REASONING.to_string(),
            suggested_focus: Some(FALLBACK_FOCUS.to_string()),
        }
    }
}
