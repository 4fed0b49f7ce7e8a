//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System message for every reply
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// User turn: running summary plus the new utterance
pub const CHAT: &str = include_str!("../../prompts/chat.pmt");

/// Progressive summarization of the conversation so far
pub const SUMMARY: &str = include_str!("../../prompts/summary.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => Some(SYSTEM),
        "chat" => Some(CHAT),
        "summary" => Some(SUMMARY),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_system() {
        let system = get_embedded("system").unwrap();
        assert!(system.contains("helpful, respectful and honest"));
    }

    #[test]
    fn test_get_embedded_chat_has_variables() {
        let chat = get_embedded("chat").unwrap();
        assert!(chat.contains("{{input}}"));
        assert!(chat.contains("{{history}}"));
    }

    #[test]
    fn test_get_embedded_summary_has_variables() {
        let summary = get_embedded("summary").unwrap();
        assert!(summary.contains("{{summary}}"));
        assert!(summary.contains("{{new_lines}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
