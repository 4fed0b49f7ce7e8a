//! Mutable planner state

use serde::Serialize;

/// Emotion label before anything was classified
pub const UNKNOWN_EMOTION: &str = "Unknown";

/// Toxicity before anything was classified
pub const DEFAULT_TOXICITY: f64 = 0.5;

/// Whether the planner still takes turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerPhase {
    Active,
    Terminated,
}

/// Per-conversation state, owned by one planner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerState {
    pub(crate) message_count: u32,
    pub(crate) last_emotion: String,
    pub(crate) last_toxicity: f64,
    pub(crate) phase: PlannerPhase,
}

impl Default for PlannerState {
    fn default() -> Self {
        Self {
            message_count: 0,
            last_emotion: UNKNOWN_EMOTION.to_string(),
            last_toxicity: DEFAULT_TOXICITY,
            phase: PlannerPhase::Active,
        }
    }
}

impl PlannerState {
    /// Observations processed so far
    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    /// Emotion label of the last classified utterance
    pub fn last_emotion(&self) -> &str {
        &self.last_emotion
    }

    /// Toxicity of the last classified utterance, in [0, 1]
    pub fn last_toxicity(&self) -> f64 {
        self.last_toxicity
    }

    pub fn phase(&self) -> PlannerPhase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == PlannerPhase::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = PlannerState::default();
        assert_eq!(state.message_count(), 0);
        assert_eq!(state.last_emotion(), "Unknown");
        assert_eq!(state.last_toxicity(), 0.5);
        assert_eq!(state.phase(), PlannerPhase::Active);
        assert!(!state.is_terminated());
    }
}
