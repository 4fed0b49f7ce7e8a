//! chatagent configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main chatagent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Sampling parameters for reply generation
    pub generation: GenerationConfig,

    /// Dialogue planner settings
    pub agent: AgentConfig,

    /// Hosted classifier and captioner models
    pub classifiers: ClassifiersConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .chatagent.yml
        let local_config = PathBuf::from(".chatagent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/chatagent/chatagent.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("chatagent").join("chatagent.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".chatagent.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("chatagent").join("chatagent.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported, any compatible server works)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Upper bound on tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient HTTP failures (0 disables)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "meta-llama/Llama-2-7b-chat-hf".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "http://localhost:8000".to_string(),
            max_tokens: 2048,
            timeout_ms: 120_000,
            max_retries: 3,
        }
    }
}

impl LlmConfig {
    /// API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        read_key(&self.api_key_env)
    }
}

fn read_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|k| !k.trim().is_empty())
}

/// Sampling parameters for reply generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature, in (0, 1]
    pub temperature: f32,

    /// Maximum new tokens per reply, in [1, 2048]
    #[serde(rename = "max-new-tokens")]
    pub max_new_tokens: u32,

    /// Stop sequences that end a reply
    pub stop: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_new_tokens: 128,
            stop: vec![],
        }
    }
}

/// How observations are normalized before classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizerKind {
    /// Split on the delimiter and concatenate the fragments
    #[default]
    DelimiterJoin,
    /// Leave the observation untouched
    Passthrough,
    /// Replace delimited image paths with generated captions
    Captioning,
}

/// Dialogue planner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Observations allowed before the planner says goodbye
    #[serde(rename = "max-messages")]
    pub max_messages: u32,

    /// First message of every conversation
    pub greeting: String,

    /// Message sent when the budget runs out
    pub farewell: String,

    /// Whether reset() also restarts the message budget
    #[serde(rename = "reset-restarts-budget")]
    pub reset_restarts_budget: bool,

    /// Send the normalized observation to the memory chain instead of the raw one
    #[serde(rename = "forward-normalized")]
    pub forward_normalized: bool,

    /// Normalization policy
    pub normalizer: NormalizerKind,

    /// Delimiter used by the delimiter-join and captioning policies
    pub delimiter: char,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_messages: crate::DEFAULT_MAX_MESSAGES,
            greeting: crate::DEFAULT_GREETING.to_string(),
            farewell: crate::DEFAULT_FAREWELL.to_string(),
            reset_restarts_budget: false,
            forward_normalized: false,
            normalizer: NormalizerKind::default(),
            delimiter: '`',
        }
    }
}

/// Hosted classifier and captioner models (Hugging Face Inference API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifiersConfig {
    /// Inference API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the access token
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Emotion classification model
    #[serde(rename = "emotion-model")]
    pub emotion_model: String,

    /// Toxicity model (reports a non-toxicity reward)
    #[serde(rename = "toxicity-model")]
    pub toxicity_model: String,

    /// Image captioning model
    #[serde(rename = "caption-model")]
    pub caption_model: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient HTTP failures (0 disables)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for ClassifiersConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_string(),
            api_key_env: "HF_TOKEN".to_string(),
            emotion_model: "SamLowe/roberta-base-go_emotions".to_string(),
            toxicity_model: "nicholasKluge/ToxicityModel".to_string(),
            caption_model: "Salesforce/blip-image-captioning-large".to_string(),
            timeout_ms: 60_000,
            max_retries: 3,
        }
    }
}

impl ClassifiersConfig {
    /// Access token from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        read_key(&self.api_key_env)
    }
}

/// Prompt template overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `{name}.pmt` overrides before the embedded defaults
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".chatagent/prompts"),
        }
    }
}
