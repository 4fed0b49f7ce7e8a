//! Where observations come from
//!
//! The driver hands every agent message to an [`InputSource`], which shows it
//! to the user and returns their reply (or an interrupt).

use std::collections::VecDeque;
use std::path::Path;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::debug;

/// Errors from reading user input
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Readline error: {0}")]
    Readline(#[from] ReadlineError),

    #[error("Failed to read script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What the user did when asked for input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A line of input
    Line(String),
    /// The user (or the script) stopped the conversation
    Interrupted,
}

/// Shows agent messages and collects user replies
pub trait InputSource {
    /// Show `message` and wait for the user's reply
    fn ask(&mut self, message: &str) -> Result<InputEvent, InputError>;

    /// Show a final `message`; no reply is expected
    fn announce(&mut self, message: &str) -> Result<(), InputError>;
}

fn print_agent(message: &str) {
    println!("{} {}", "agent:".bright_cyan().bold(), message);
}

/// A fixed list of utterances; running out interrupts the conversation
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    shown: Vec<String>,
    echo: bool,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            shown: Vec::new(),
            echo: false,
        }
    }

    /// Load a script: one utterance per non-empty line
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        debug!(?path, "ScriptedInput::from_file: called");
        let bytes = std::fs::read(path).map_err(|source| InputError::Script {
            path: path.display().to_string(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(Self::new(
            text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string),
        ))
    }

    /// Print the dialogue to stdout as it happens
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Agent messages shown so far, announcements included
    pub fn shown(&self) -> &[String] {
        &self.shown
    }

    /// Utterances not yet used
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputSource for ScriptedInput {
    fn ask(&mut self, message: &str) -> Result<InputEvent, InputError> {
        self.shown.push(message.to_string());
        if self.echo {
            print_agent(message);
        }

        match self.lines.pop_front() {
            Some(line) => {
                if self.echo {
                    println!("{} {}", ">".bright_green(), line);
                }
                Ok(InputEvent::Line(line))
            }
            None => {
                debug!("ScriptedInput::ask: script exhausted");
                Ok(InputEvent::Interrupted)
            }
        }
    }

    fn announce(&mut self, message: &str) -> Result<(), InputError> {
        self.shown.push(message.to_string());
        if self.echo {
            print_agent(message);
        }
        Ok(())
    }
}

/// Interactive input with line editing; Ctrl+C or Ctrl+D interrupts
pub struct ReadlineInput {
    rl: DefaultEditor,
}

impl ReadlineInput {
    pub fn new() -> Result<Self, InputError> {
        Ok(Self {
            rl: DefaultEditor::new()?,
        })
    }
}

impl InputSource for ReadlineInput {
    fn ask(&mut self, message: &str) -> Result<InputEvent, InputError> {
        print_agent(message);

        loop {
            match self.rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = self.rl.add_history_entry(input);
                    return Ok(InputEvent::Line(input.to_string()));
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    return Ok(InputEvent::Interrupted);
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    return Ok(InputEvent::Interrupted);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn announce(&mut self, message: &str) -> Result<(), InputError> {
        print_agent(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_yields_lines_then_interrupts() {
        let mut input = ScriptedInput::new(["hello", "bye"]);

        assert_eq!(input.ask("greeting").unwrap(), InputEvent::Line("hello".to_string()));
        assert_eq!(input.ask("reply").unwrap(), InputEvent::Line("bye".to_string()));
        assert_eq!(input.ask("again?").unwrap(), InputEvent::Interrupted);
        assert_eq!(input.shown(), ["greeting", "reply", "again?"]);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_announce_is_recorded() {
        let mut input = ScriptedInput::new(Vec::<String>::new());
        input.announce("Goodbye!").unwrap();
        assert_eq!(input.shown(), ["Goodbye!"]);
    }

    #[test]
    fn test_from_file_skips_blank_lines_and_tolerates_bad_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"  Hello!  \n\n\xffWhat's my name?\n   \n").unwrap();

        let mut input = ScriptedInput::from_file(file.path()).unwrap();

        assert_eq!(input.remaining(), 2);
        assert_eq!(input.ask("a").unwrap(), InputEvent::Line("Hello!".to_string()));
        assert_eq!(
            input.ask("b").unwrap(),
            InputEvent::Line("\u{fffd}What's my name?".to_string())
        );
    }

    #[test]
    fn test_from_missing_file_fails() {
        let result = ScriptedInput::from_file(Path::new("/nonexistent/script.txt"));
        assert!(matches!(result, Err(InputError::Script { .. })));
    }
}
