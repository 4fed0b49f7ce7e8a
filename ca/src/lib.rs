//! chatagent - turn-based conversational agent
//!
//! A small agent that chains remote models behind a dialogue loop: a language
//! model with summary memory writes the replies, while hosted classifiers track
//! the emotion and toxicity of what the user says.
//!
//! # Core Concepts
//!
//! - **Single-step planner**: [`agent::DialoguePlanner`] decides one action per turn
//! - **Message budget**: the planner says goodbye after `max-messages` observations
//! - **Pluggable collaborators**: memory, classifiers and captioner are traits
//!
//! # Modules
//!
//! - [`agent`] - Planner, actions, state, observation normalizers
//! - [`memory`] - Conversation memory trait and summary-memory chain
//! - [`classify`] - Emotion/toxicity/caption traits and Hugging Face client
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`prompts`] - Handlebars prompt templates
//! - [`retry`] - Backoff timing for the HTTP clients
//! - [`driver`] - Conversation loop and input sources
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod classify;
pub mod cli;
pub mod config;
pub mod driver;
pub mod llm;
pub mod memory;
pub mod prompts;
pub mod retry;
pub mod setup;

/// Observations allowed before the planner says goodbye
pub const DEFAULT_MAX_MESSAGES: u32 = 10;

/// First message of every conversation
pub const DEFAULT_GREETING: &str = "Hello World! How can I help you?";

/// Last message once the budget is spent
pub const DEFAULT_FAREWELL: &str = "Thanks so much for the chat, and hope to see ya later! Goodbye!";

// Re-export commonly used types
pub use agent::{AgentAction, DialoguePlanner, PlannerConfig, PlannerError, PlannerState, Turn};
pub use config::Config;
pub use driver::{ConversationDriver, ConversationOutcome, EndReason, InputEvent, InputSource, ScriptedInput};
pub use llm::{LlmClient, LlmError, create_client};
pub use memory::{ConversationMemory, GenerationParams, MemoryError, SummaryMemoryChain};
