use serde::{Deserialize, Serialize};

use triage_core::models::decision::FALLBACK_DECISION_THRESHOLD;

/// When to stop asking follow-up questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SufficiencyPolicy {
    /// Ask the model after every answer whether more information is needed.
    /// An optional cap stops questioning regardless of the model's answer.
    Dynamic { hard_cap: Option<u32> },
    /// Ask exactly `max_turns` follow-up questions.
    Fixed { max_turns: u32 },
}

impl Default for SufficiencyPolicy {
    fn default() -> Self {
        Self::Dynamic { hard_cap: None }
    }
}

impl SufficiencyPolicy {
    /// The hard upper bound on follow-up turns, if any.
    pub fn max_turns(&self) -> Option<u32> {
        match *self {
            Self::Dynamic { hard_cap } => hard_cap,
            Self::Fixed { max_turns } => Some(max_turns),
        }
    }

    /// Whether `turn_count` answered turns reach the cap. The cap wins over
    /// any model judgment.
    pub fn cap_reached(&self, turn_count: u32) -> bool {
        self.max_turns().is_some_and(|max| turn_count >= max)
    }

    pub fn consults_model(&self) -> bool {
        matches!(self, Self::Dynamic { .. })
    }

    /// Denominator for progress display. Without a cap, the number of
    /// answers after which the fallback decision stops asking.
    pub fn nominal_turns(&self) -> u32 {
        self.max_turns()
            .unwrap_or(FALLBACK_DECISION_THRESHOLD as u32)
            .max(1)
    }
}
