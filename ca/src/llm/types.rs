//! LLM request/response types
//!
//! Modeled on the OpenAI Chat Completions API, which is also what local
//! Llama servers (vLLM, TGI, llama.cpp) expose.

use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from Handlebars template); omitted when empty
    pub system_prompt: String,

    /// User message (rendered from Handlebars template)
    pub prompt: String,

    /// Max tokens for response
    pub max_tokens: u32,

    /// Sampling temperature; provider default when None
    pub temperature: Option<f32>,

    /// Stop sequences that end generation early
    pub stop: Vec<String>,
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage
    pub usage: TokenUsage,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Natural end or a stop sequence
    EndTurn,
    /// Cut off by the token budget
    MaxTokens,
}

impl StopReason {
    /// Parse from an OpenAI-style finish_reason string
    pub fn from_finish_reason(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_finish_reason: called");
        match s {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
impl CompletionRequest {
    /// Request with only a system prompt and a user prompt
    pub fn single(system_prompt: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
            stop: vec![],
        }
    }
}

#[cfg(test)]
impl CompletionResponse {
    /// Response carrying plain text that ended naturally
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// Response cut off by the token budget
    pub fn truncated(content: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::MaxTokens,
            ..Self::text(content)
        }
    }
}
