//! Build a planner and its collaborators from configuration

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info};

use crate::agent::{DialoguePlanner, ObservationNormalizer, PlannerConfig, normalizer_for};
use crate::classify::{HfCaptioner, HfInferenceClient, HfTextClassifier, ImageCaptioner};
use crate::config::{Config, NormalizerKind};
use crate::llm::create_client;
use crate::memory::{GenerationParams, SummaryMemoryChain};
use crate::prompts::PromptLoader;

/// Validated planner settings, with an optional `--max-messages` override
pub fn planner_config(config: &Config, max_messages: Option<u32>) -> Result<PlannerConfig> {
    let mut settings = config.agent.clone();
    if let Some(max) = max_messages {
        debug!(%max, "planner_config: overriding max-messages");
        settings.max_messages = max;
    }
    PlannerConfig::from_settings(&settings).context("Invalid agent configuration")
}

/// Shared Inference API client for classifiers and the captioner
pub fn inference_client(config: &Config) -> Result<Arc<HfInferenceClient>> {
    Ok(Arc::new(
        HfInferenceClient::from_config(&config.classifiers).context("Failed to create inference client")?,
    ))
}

/// The configured observation normalizer; only the captioning policy uses `hf`
pub fn normalizer(config: &Config, hf: Arc<HfInferenceClient>) -> Box<dyn ObservationNormalizer> {
    let captioner: Option<Arc<dyn ImageCaptioner>> = match config.agent.normalizer {
        NormalizerKind::Captioning => Some(Arc::new(HfCaptioner::new(hf, config.classifiers.caption_model.clone()))),
        _ => None,
    };
    normalizer_for(config.agent.normalizer, config.agent.delimiter, captioner)
}

/// Wire a planner: summary-memory chain over the configured LLM, hosted
/// classifiers, and the configured normalizer
pub fn build_planner(config: &Config, max_messages: Option<u32>) -> Result<DialoguePlanner> {
    debug!("build_planner: called");
    let planner_config = planner_config(config, max_messages)?;
    let params = GenerationParams::from_config(&config.generation).context("Invalid generation configuration")?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let memory = SummaryMemoryChain::new(llm, PromptLoader::new(&config.prompts.dir), params);

    let hf = inference_client(config)?;
    let emotion = Arc::new(HfTextClassifier::new(hf.clone(), config.classifiers.emotion_model.clone()));
    let toxicity = Arc::new(HfTextClassifier::new(hf.clone(), config.classifiers.toxicity_model.clone()));
    let normalizer = normalizer(config, hf);

    info!(
        model = %config.llm.model,
        max_messages = planner_config.max_messages(),
        normalizer = ?config.agent.normalizer,
        "build_planner: planner ready"
    );

    Ok(DialoguePlanner::new(planner_config, Box::new(memory), emotion, toxicity).with_normalizer(normalizer))
}
