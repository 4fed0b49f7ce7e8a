//! DialoguePlanner - decides the agent's next action each turn

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::action::{AgentAction, Turn};
use super::config::PlannerConfig;
use super::normalize::{DelimiterJoin, ObservationNormalizer};
use super::state::{DEFAULT_TOXICITY, PlannerPhase, PlannerState, UNKNOWN_EMOTION};
use crate::classify::{EmotionClassifier, ToxicityClassifier, toxicity_from_non_toxicity};
use crate::memory::{ConversationMemory, MemoryError};

/// Errors surfaced by [`DialoguePlanner::plan`]
///
/// Classifier failures never show up here; they fall back to defaults.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Failed to generate a reply: {0}")]
    Generation(#[from] MemoryError),
}

/// Single-step dialogue planner
///
/// On each call it greets (empty history), tracks emotion and toxicity of the
/// latest observation, says goodbye once the message budget is spent, and
/// otherwise asks the memory engine for a reply.
pub struct DialoguePlanner {
    config: PlannerConfig,
    state: PlannerState,
    memory: Box<dyn ConversationMemory>,
    emotion: Arc<dyn EmotionClassifier>,
    toxicity: Arc<dyn ToxicityClassifier>,
    normalizer: Box<dyn ObservationNormalizer>,
}

impl DialoguePlanner {
    /// Create a planner with the default backtick normalizer
    pub fn new(
        config: PlannerConfig,
        memory: Box<dyn ConversationMemory>,
        emotion: Arc<dyn EmotionClassifier>,
        toxicity: Arc<dyn ToxicityClassifier>,
    ) -> Self {
        debug!(max_messages = config.max_messages(), "DialoguePlanner::new: called");
        Self {
            config,
            state: PlannerState::default(),
            memory,
            emotion,
            toxicity,
            normalizer: Box::new(DelimiterJoin::default()),
        }
    }

    /// Replace the observation normalization policy
    pub fn with_normalizer(mut self, normalizer: Box<dyn ObservationNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn memory(&self) -> &dyn ConversationMemory {
        self.memory.as_ref()
    }

    /// Decide the next action from the history and the latest observation
    ///
    /// An empty history always yields the greeting. Every other call consumes
    /// one observation from the message budget; the farewell is returned once
    /// the budget is spent, before any reply is generated.
    pub async fn plan(&mut self, history: &[Turn], observation: &str) -> Result<AgentAction, PlannerError> {
        debug!(history_len = history.len(), observation_len = observation.len(), "plan: called");

        if history.is_empty() {
            debug!("plan: empty history, greeting");
            return Ok(AgentAction::ask(self.config.greeting()));
        }

        let normalized = if observation.is_empty() {
            debug!("plan: empty observation, skipping classification");
            None
        } else {
            let normalized = self.normalizer.normalize(observation).await;
            self.classify(&normalized).await;
            Some(normalized)
        };

        self.state.message_count = self.state.message_count.saturating_add(1);

        if self.state.message_count >= self.config.max_messages() {
            if !self.state.is_terminated() {
                info!(
                    message_count = self.state.message_count,
                    "plan: message budget spent, ending conversation"
                );
            }
            self.state.phase = PlannerPhase::Terminated;
            return Ok(AgentAction::finish(self.config.farewell()));
        }

        let input = match (&normalized, self.config.forward_normalized()) {
            (Some(n), true) => n.as_str(),
            _ => observation,
        };
        let reply = self.memory.respond(input).await?;
        debug!(reply_len = reply.len(), "plan: reply generated");
        Ok(AgentAction::ask(reply))
    }

    /// Forget the classified signals and the memory engine's history
    ///
    /// The message budget is kept unless the config says otherwise.
    pub fn reset(&mut self) {
        debug!("reset: called");
        self.state.last_toxicity = 0.0;
        self.state.last_emotion = UNKNOWN_EMOTION.to_string();
        self.memory.clear();

        if self.config.reset_restarts_budget() {
            debug!("reset: restarting message budget");
            self.state.message_count = 0;
            self.state.phase = PlannerPhase::Active;
        }
    }

    async fn classify(&mut self, text: &str) {
        self.state.last_emotion = match self.emotion.classify_emotion(text).await {
            Ok(label) if !label.trim().is_empty() => label,
            Ok(_) => {
                warn!("classify: emotion classifier returned an empty label");
                UNKNOWN_EMOTION.to_string()
            }
            Err(e) => {
                warn!(error = %e, "classify: emotion classification failed");
                UNKNOWN_EMOTION.to_string()
            }
        };

        let toxicity = self
            .toxicity
            .non_toxicity(text)
            .await
            .and_then(toxicity_from_non_toxicity);
        self.state.last_toxicity = match toxicity {
            Ok(toxicity) => toxicity,
            Err(e) => {
                warn!(error = %e, "classify: toxicity classification failed");
                DEFAULT_TOXICITY
            }
        };

        debug!(
            emotion = %self.state.last_emotion,
            toxicity = self.state.last_toxicity,
            "classify: signals updated"
        );
    }
}
