//! Validated, immutable planner configuration

use thiserror::Error;
use tracing::debug;

use crate::config::AgentConfig;

/// A configuration value failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Planner settings, checked once at construction
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    max_messages: u32,
    greeting: String,
    farewell: String,
    reset_restarts_budget: bool,
    forward_normalized: bool,
}

impl PlannerConfig {
    /// Validate and build a planner configuration
    ///
    /// `max_messages` must be greater than 1; greeting and farewell must not be blank.
    pub fn new(max_messages: u32, greeting: impl Into<String>, farewell: impl Into<String>) -> Result<Self, ConfigError> {
        debug!(%max_messages, "PlannerConfig::new: called");
        let greeting = greeting.into();
        let farewell = farewell.into();

        if max_messages <= 1 {
            return Err(ConfigError::invalid(
                "max-messages",
                format!("{} must be greater than 1", max_messages),
            ));
        }
        if greeting.trim().is_empty() {
            return Err(ConfigError::invalid("greeting", "must not be empty"));
        }
        if farewell.trim().is_empty() {
            return Err(ConfigError::invalid("farewell", "must not be empty"));
        }

        Ok(Self {
            max_messages,
            greeting,
            farewell,
            reset_restarts_budget: false,
            forward_normalized: false,
        })
    }

    /// Build from the `agent` config section
    pub fn from_settings(settings: &AgentConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(settings.max_messages, settings.greeting.clone(), settings.farewell.clone())?
            .with_reset_restarts_budget(settings.reset_restarts_budget)
            .with_forward_normalized(settings.forward_normalized))
    }

    /// Make reset() also restart the message budget
    pub fn with_reset_restarts_budget(mut self, enabled: bool) -> Self {
        self.reset_restarts_budget = enabled;
        self
    }

    /// Forward the normalized observation to the memory engine
    pub fn with_forward_normalized(mut self, enabled: bool) -> Self {
        self.forward_normalized = enabled;
        self
    }

    pub fn max_messages(&self) -> u32 {
        self.max_messages
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn farewell(&self) -> &str {
        &self.farewell
    }

    pub fn reset_restarts_budget(&self) -> bool {
        self.reset_restarts_budget
    }

    pub fn forward_normalized(&self) -> bool {
        self.forward_normalized
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_messages: crate::DEFAULT_MAX_MESSAGES,
            greeting: crate::DEFAULT_GREETING.to_string(),
            farewell: crate::DEFAULT_FAREWELL.to_string(),
            reset_restarts_budget: false,
            forward_normalized: false,
        }
    }
}
