//! chatagent - conversational agent CLI
//!
//! Interactive chat, scripted replays and one-shot classification.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use chatagent::agent::ObservationNormalizer;
use chatagent::classify::{EmotionClassifier, HfTextClassifier, ToxicityClassifier, toxicity_from_non_toxicity};
use chatagent::cli::{Cli, Command};
use chatagent::config::Config;
use chatagent::driver::{ConversationDriver, ConversationOutcome, EndReason, InputSource, ReadlineInput, ScriptedInput};
use chatagent::setup::{build_planner, inference_client, normalizer};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing here can log
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("chatagent.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "chatagent loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Chat { max_messages }) => cmd_chat(&config, max_messages).await,
        Some(Command::Run {
            script,
            transcript,
            max_messages,
        }) => cmd_run(&config, &script, transcript.as_deref(), max_messages).await,
        Some(Command::Classify { text }) => cmd_classify(&config, &text).await,
        None => cmd_chat(&config, None).await,
    }
}

/// Interactive conversation on the terminal
async fn cmd_chat(config: &Config, max_messages: Option<u32>) -> Result<()> {
    debug!(?max_messages, "cmd_chat: called");
    let mut input = ReadlineInput::new().context("Failed to initialize line editor")?;
    let outcome = converse(config, max_messages, &mut input).await?;
    report(&outcome);
    Ok(())
}

/// Scripted conversation, optionally saved as a JSON transcript
async fn cmd_run(config: &Config, script: &Path, transcript: Option<&Path>, max_messages: Option<u32>) -> Result<()> {
    debug!(?script, ?transcript, ?max_messages, "cmd_run: called");
    let mut input = ScriptedInput::from_file(script)
        .context("Failed to load script")?
        .with_echo(true);
    let outcome = converse(config, max_messages, &mut input).await?;
    report(&outcome);

    if let Some(path) = transcript {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize transcript")?;
        fs::write(path, json).context(format!("Failed to write transcript to {}", path.display()))?;
        println!("{} Transcript written to {}", "✓".green(), path.display().to_string().cyan());
    }
    Ok(())
}

async fn converse(
    config: &Config,
    max_messages: Option<u32>,
    input: &mut dyn InputSource,
) -> Result<ConversationOutcome> {
    let planner = build_planner(config, max_messages)?;
    let mut driver = ConversationDriver::new(planner);
    driver
        .run_until(input, ctrl_c())
        .await
        .map_err(|e| eyre!("Conversation failed: {}", e))
}

/// Completes on Ctrl+C; never completes if the handler can't be installed
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            debug!("ctrl_c: received");
            println!();
        }
        Err(e) => {
            warn!(error = %e, "ctrl_c: failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

fn report(outcome: &ConversationOutcome) {
    match &outcome.end {
        EndReason::Finished => {}
        EndReason::Interrupted => println!("{}", "Conversation interrupted, bye.".dimmed()),
        EndReason::GenerationFailed { error } => {
            eprintln!("{} {}", "generation failed:".red(), error);
        }
    }
    println!(
        "{} messages: {}, emotion: {}, toxicity: {:.3}",
        "state".dimmed(),
        outcome.state.message_count(),
        outcome.state.last_emotion().yellow(),
        outcome.state.last_toxicity()
    );
}

/// Normalize and classify one utterance
async fn cmd_classify(config: &Config, text: &str) -> Result<()> {
    debug!(text_len = text.len(), "cmd_classify: called");
    let hf = inference_client(config)?;
    let emotion_classifier = HfTextClassifier::new(hf.clone(), config.classifiers.emotion_model.clone());
    let toxicity_classifier = HfTextClassifier::new(hf.clone(), config.classifiers.toxicity_model.clone());
    let normalizer = normalizer(config, hf);
    let normalized = normalizer.normalize(text).await;

    let emotion = emotion_classifier
        .classify_emotion(&normalized)
        .await
        .context("Emotion classification failed")?;
    let toxicity = toxicity_classifier
        .non_toxicity(&normalized)
        .await
        .and_then(toxicity_from_non_toxicity)
        .context("Toxicity classification failed")?;

    println!("{} {}", "text:".dimmed(), normalized);
    println!("{} {}", "emotion:".dimmed(), emotion.yellow());
    println!("{} {:.3}", "toxicity:".dimmed(), toxicity);
    Ok(())
}
