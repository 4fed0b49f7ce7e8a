//! Agent actions and conversation turns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tool that shows a message to the user and waits for their reply
pub const ASK_FOR_INPUT_TOOL: &str = "Ask-For-Input Tool";

/// What the planner wants to do next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAction {
    /// Interaction channel the input is sent to
    pub tool: String,
    /// Message for the user
    pub input: String,
    /// Ends the conversation
    pub is_final: bool,
}

impl AgentAction {
    /// Send `message` to the user and wait for the next observation
    pub fn ask(message: impl Into<String>) -> Self {
        debug!("AgentAction::ask: called");
        Self {
            tool: ASK_FOR_INPUT_TOOL.to_string(),
            input: message.into(),
            is_final: false,
        }
    }

    /// Say `message` and end the conversation
    pub fn finish(message: impl Into<String>) -> Self {
        debug!("AgentAction::finish: called");
        Self {
            tool: ASK_FOR_INPUT_TOOL.to_string(),
            input: message.into(),
            is_final: true,
        }
    }
}

/// One (action, observation) exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub action: AgentAction,
    pub observation: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn new(action: AgentAction, observation: impl Into<String>) -> Self {
        Self {
            action,
            observation: observation.into(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_is_continuing() {
        let action = AgentAction::ask("Hello World! How can I help you?");
        assert_eq!(action.tool, ASK_FOR_INPUT_TOOL);
        assert!(!action.is_final);
    }

    #[test]
    fn test_finish_is_final() {
        let action = AgentAction::finish("Goodbye!");
        assert_eq!(action.input, "Goodbye!");
        assert!(action.is_final);
    }

    #[test]
    fn test_turn_serializes_for_transcripts() {
        let turn = Turn::new(AgentAction::ask("hi"), "hello");
        let json = serde_json::to_value(&turn).unwrap();

        assert_eq!(json["action"]["tool"], ASK_FOR_INPUT_TOOL);
        assert_eq!(json["observation"], "hello");
        assert!(json["at"].is_string());
    }
}
