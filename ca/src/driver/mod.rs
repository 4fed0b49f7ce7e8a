//! Conversation driver
//!
//! Runs the turn loop around a [`DialoguePlanner`]: ask the planner for an
//! action, show it through an [`InputSource`], feed the reply back as the next
//! observation, until the planner says goodbye or the user interrupts.

mod input;

pub use input::{InputError, InputEvent, InputSource, ReadlineInput, ScriptedInput};

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agent::{ASK_FOR_INPUT_TOOL, DialoguePlanner, PlannerError, PlannerState, Turn};

/// Shown when no reply could be generated
pub const GENERATION_APOLOGY: &str = "Sorry, I couldn't come up with a reply. Let's pick this up another time!";

/// Errors that stop the driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Planner asked for unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Why a conversation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum EndReason {
    /// The planner returned a terminal action
    Finished,
    /// The user, the script, or a shutdown signal stopped early
    Interrupted,
    /// The memory engine failed; the driver said goodbye on its behalf
    GenerationFailed { error: String },
}

/// Everything that happened in one conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationOutcome {
    pub turns: Vec<Turn>,
    pub end: EndReason,
    /// Last message shown without asking for a reply
    pub final_message: Option<String>,
    pub state: PlannerState,
}

/// Drives one planner through a conversation
pub struct ConversationDriver {
    planner: DialoguePlanner,
}

impl ConversationDriver {
    pub fn new(planner: DialoguePlanner) -> Self {
        Self { planner }
    }

    pub fn planner(&self) -> &DialoguePlanner {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut DialoguePlanner {
        &mut self.planner
    }

    /// Run a full conversation against `input`
    pub async fn run(&mut self, input: &mut dyn InputSource) -> Result<ConversationOutcome, DriverError> {
        self.run_until(input, std::future::pending()).await
    }

    /// Run a conversation that ends as interrupted once `shutdown` completes
    ///
    /// `shutdown` is watched while the planner works; a pending model call is
    /// dropped. Turns collected so far are kept in the outcome.
    pub async fn run_until<F>(
        &mut self,
        input: &mut dyn InputSource,
        shutdown: F,
    ) -> Result<ConversationOutcome, DriverError>
    where
        F: Future<Output = ()>,
    {
        debug!("ConversationDriver::run_until: called");
        let mut turns: Vec<Turn> = Vec::new();
        let mut observation = String::new();
        tokio::pin!(shutdown);

        let (end, final_message) = loop {
            let planned = tokio::select! {
                result = self.planner.plan(&turns, &observation) => Some(result),
                _ = &mut shutdown => None,
            };

            let action = match planned {
                Some(Ok(action)) => action,
                None => {
                    info!(turns = turns.len(), "ConversationDriver::run_until: shutdown requested");
                    break (EndReason::Interrupted, None);
                }
                Some(Err(PlannerError::Generation(e))) => {
                    warn!(error = %e, "ConversationDriver::run_until: generation failed, ending conversation");
                    input.announce(GENERATION_APOLOGY)?;
                    break (
                        EndReason::GenerationFailed { error: e.to_string() },
                        Some(GENERATION_APOLOGY.to_string()),
                    );
                }
            };

            if action.tool != ASK_FOR_INPUT_TOOL {
                return Err(DriverError::UnknownTool(action.tool));
            }

            if action.is_final {
                input.announce(&action.input)?;
                break (EndReason::Finished, Some(action.input));
            }

            match input.ask(&action.input)? {
                InputEvent::Line(line) => {
                    debug!(turn = turns.len() + 1, "ConversationDriver::run_until: got observation");
                    observation = line.clone();
                    turns.push(Turn::new(action, line));
                }
                InputEvent::Interrupted => {
                    debug!("ConversationDriver::run_until: interrupted");
                    break (EndReason::Interrupted, None);
                }
            }
        };

        let state = self.planner.state().clone();
        info!(
            turns = turns.len(),
            ?end,
            emotion = %state.last_emotion(),
            toxicity = state.last_toxicity(),
            "ConversationDriver::run_until: conversation ended"
        );

        Ok(ConversationOutcome {
            turns,
            end,
            final_message,
            state,
        })
    }
}
