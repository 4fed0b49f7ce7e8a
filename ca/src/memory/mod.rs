//! Conversation memory
//!
//! The memory engine produces a reply to each user utterance while keeping
//! enough of the exchange to stay on topic. [`SummaryMemoryChain`] keeps a
//! running summary that is folded forward after every reply.

mod summary;

pub use summary::SummaryMemoryChain;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::agent::ConfigError;
use crate::config::GenerationConfig;
use crate::llm::LlmError;
use crate::prompts::PromptError;

/// Upper bound on `max_new_tokens`
pub const MAX_NEW_TOKENS_LIMIT: u32 = 2048;

/// Errors raised while generating a reply
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Model returned an empty reply")]
    EmptyReply,
}

/// Stateful reply generator
#[async_trait]
pub trait ConversationMemory: Send {
    /// Generate a reply to `input` and remember the exchange
    async fn respond(&mut self, input: &str) -> Result<String, MemoryError>;

    /// Forget everything remembered so far
    fn clear(&mut self);

    /// What is currently remembered, as text
    fn summary(&self) -> &str;
}

/// Validated sampling parameters for reply generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    temperature: f32,
    max_new_tokens: u32,
    stop: Vec<String>,
}

impl GenerationParams {
    /// Validate and build generation parameters
    ///
    /// `temperature` must be in (0, 1] and `max_new_tokens` in [1, 2048].
    pub fn new(temperature: f32, max_new_tokens: u32, stop: Vec<String>) -> Result<Self, ConfigError> {
        debug!(%temperature, %max_new_tokens, "GenerationParams::new: called");
        if !(temperature > 0.0 && temperature <= 1.0) {
            return Err(ConfigError::invalid("temperature", format!("{} is not in (0, 1]", temperature)));
        }
        if max_new_tokens == 0 || max_new_tokens > MAX_NEW_TOKENS_LIMIT {
            return Err(ConfigError::invalid(
                "max-new-tokens",
                format!("{} is not in [1, {}]", max_new_tokens, MAX_NEW_TOKENS_LIMIT),
            ));
        }
        Ok(Self {
            temperature,
            max_new_tokens,
            stop,
        })
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self, ConfigError> {
        Self::new(config.temperature, config.max_new_tokens, config.stop.clone())
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_new_tokens(&self) -> u32 {
        self.max_new_tokens
    }

    pub fn stop(&self) -> &[String] {
        &self.stop
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_new_tokens: 128,
            stop: vec![],
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_params_defaults_match_config() {
        let from_config = GenerationParams::from_config(&GenerationConfig::default()).unwrap();
        assert_eq!(from_config, GenerationParams::default());
    }

    #[test]
    fn test_generation_params_bounds() {
        assert!(GenerationParams::new(1.0, 1, vec![]).is_ok());
        assert!(GenerationParams::new(0.01, 2048, vec![]).is_ok());

        assert!(GenerationParams::new(0.0, 128, vec![]).is_err());
        assert!(GenerationParams::new(1.5, 128, vec![]).is_err());
        assert!(GenerationParams::new(f32::NAN, 128, vec![]).is_err());
        assert!(GenerationParams::new(0.6, 0, vec![]).is_err());
        assert!(GenerationParams::new(0.6, 2049, vec![]).is_err());
    }

    #[test]
    fn test_generation_params_error_names_field() {
        let err = GenerationParams::new(0.6, 0, vec![]).unwrap_err();
        assert!(err.to_string().contains("max-new-tokens"));
    }
}
