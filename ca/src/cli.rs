//! CLI argument parsing for chatagent

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ca")]
#[command(author, version, about = "Turn-based conversational agent with emotion and toxicity tracking", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chat interactively (default)
    Chat {
        /// Observations allowed before the agent says goodbye
        #[arg(short, long)]
        max_messages: Option<u32>,
    },

    /// Replay a script, one utterance per non-empty line
    Run {
        /// Script file
        #[arg(required = true)]
        script: PathBuf,

        /// Write a JSON transcript here
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Observations allowed before the agent says goodbye
        #[arg(short, long)]
        max_messages: Option<u32>,
    },

    /// Classify a single utterance
    Classify {
        /// Text to classify
        #[arg(required = true)]
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_chat() {
        let cli = Cli::try_parse_from(["ca"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_run_with_options() {
        let cli = Cli::try_parse_from([
            "ca",
            "run",
            "script.txt",
            "--transcript",
            "out.json",
            "--max-messages",
            "4",
            "-l",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Command::Run {
                script,
                transcript,
                max_messages,
            }) => {
                assert_eq!(script, PathBuf::from("script.txt"));
                assert_eq!(transcript, Some(PathBuf::from("out.json")));
                assert_eq!(max_messages, Some(4));
            }
            other => panic!("expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_requires_text() {
        assert!(Cli::try_parse_from(["ca", "classify"]).is_err());
    }
}
