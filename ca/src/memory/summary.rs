//! Summary-memory conversation chain

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{ConversationMemory, GenerationParams, MemoryError};
use crate::llm::{CompletionRequest, LlmClient, StopReason};
use crate::prompts::{ChatContext, PromptLoader, SummaryContext};

/// Token budget for a summary update
const SUMMARY_MAX_TOKENS: u32 = 256;

/// Conversation chain backed by a progressively updated summary
///
/// Each reply is generated from the system prompt plus the `chat` template
/// (running summary + new utterance). After a reply, a second call folds the
/// exchange into the summary at temperature 0.
pub struct SummaryMemoryChain {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    params: GenerationParams,
    summary: String,
}

impl SummaryMemoryChain {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, params: GenerationParams) -> Self {
        debug!(?params, "SummaryMemoryChain::new: called");
        Self {
            llm,
            prompts,
            params,
            summary: String::new(),
        }
    }

    fn reply_request(&self, input: &str) -> Result<CompletionRequest, MemoryError> {
        let system_prompt = self.prompts.system_prompt()?;
        let user = self.prompts.render(
            "chat",
            &ChatContext {
                history: &self.summary,
                input,
            },
        )?;

        Ok(CompletionRequest {
            system_prompt,
            prompt: user,
            max_tokens: self.params.max_new_tokens(),
            temperature: Some(self.params.temperature()),
            stop: self.params.stop().to_vec(),
        })
    }

    /// Fold one exchange into the running summary
    ///
    /// Failures keep the previous summary; the reply already went out.
    async fn update_summary(&mut self, input: &str, reply: &str) {
        debug!("update_summary: called");
        let new_lines = format!("Human: {}\nAI: {}", input, reply);
        let prompt = match self.prompts.render(
            "summary",
            &SummaryContext {
                summary: &self.summary,
                new_lines: &new_lines,
            },
        ) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "update_summary: failed to render summary prompt");
                return;
            }
        };

        let request = CompletionRequest {
            system_prompt: String::new(),
            prompt,
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: Some(0.0),
            stop: vec![],
        };

        match self.llm.complete(request).await {
            Ok(response) => match response.content.map(|c| c.trim().to_string()) {
                Some(summary) if !summary.is_empty() => {
                    debug!(summary_len = summary.len(), "update_summary: summary updated");
                    self.summary = summary;
                }
                _ => warn!("update_summary: model returned an empty summary, keeping previous"),
            },
            Err(e) => warn!(error = %e, "update_summary: LLM call failed, keeping previous summary"),
        }
    }
}

#[async_trait]
impl ConversationMemory for SummaryMemoryChain {
    async fn respond(&mut self, input: &str) -> Result<String, MemoryError> {
        debug!(input_len = input.len(), "SummaryMemoryChain::respond: called");
        let request = self.reply_request(input)?;
        let response = self.llm.complete(request).await?;

        let reply = response
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(MemoryError::EmptyReply)?;

        if response.stop_reason == StopReason::MaxTokens {
            warn!(
                max_new_tokens = self.params.max_new_tokens(),
                "SummaryMemoryChain::respond: reply hit the token limit and may be cut off"
            );
        }

        info!(
            reply_len = reply.len(),
            tokens = response.usage.total(),
            "SummaryMemoryChain::respond: reply generated"
        );
        self.update_summary(input, &reply).await;
        Ok(reply)
    }

    fn clear(&mut self) {
        debug!("SummaryMemoryChain::clear: called");
        self.summary.clear();
    }

    fn summary(&self) -> &str {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;

    fn chain(mock: Arc<MockLlmClient>) -> SummaryMemoryChain {
        SummaryMemoryChain::new(mock, PromptLoader::embedded_only(), GenerationParams::default())
    }

    #[tokio::test]
    async fn test_respond_returns_reply_and_updates_summary() {
        let mock = Arc::new(MockLlmClient::with_texts(&[
            "  Nice to meet you, Jacky!  ",
            "The human introduced themselves as Jacky.",
        ]));
        let mut chain = chain(mock.clone());

        let reply = chain.respond("Hello! My name is Jacky!").await.unwrap();

        assert_eq!(reply, "Nice to meet you, Jacky!");
        assert_eq!(chain.summary(), "The human introduced themselves as Jacky.");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reply_request_uses_generation_params() {
        let mock = Arc::new(MockLlmClient::with_texts(&["reply", "summary"]));
        let params = GenerationParams::new(0.3, 64, vec!["</s>".to_string()]).unwrap();
        let mut chain = SummaryMemoryChain::new(mock.clone(), PromptLoader::embedded_only(), params);

        chain.respond("tell me about deep learning").await.unwrap();

        let requests = mock.requests();
        let reply_req = &requests[0];
        assert_eq!(reply_req.max_tokens, 64);
        assert_eq!(reply_req.temperature, Some(0.3));
        assert_eq!(reply_req.stop, vec!["</s>".to_string()]);
        assert!(reply_req.system_prompt.contains("helpful"));
        assert!(reply_req.prompt.contains("Human: tell me about deep learning"));

        let summary_req = &requests[1];
        assert_eq!(summary_req.temperature, Some(0.0));
        assert!(summary_req.prompt.contains("AI: reply"));
    }

    #[tokio::test]
    async fn test_second_turn_sees_summary() {
        let mock = Arc::new(MockLlmClient::with_texts(&["Hi Jacky", "Human is Jacky.", "You are Jacky", "Same."]));
        let mut chain = chain(mock.clone());

        chain.respond("I'm Jacky").await.unwrap();
        chain.respond("What's my name?").await.unwrap();

        let requests = mock.requests();
        assert!(requests[2].prompt.contains("Human is Jacky."));
        assert_eq!(chain.summary(), "Same.");
    }

    #[tokio::test]
    async fn test_summary_failure_keeps_reply() {
        // Only one response: the summary call runs out of mock responses
        let mock = Arc::new(MockLlmClient::with_texts(&["reply"]));
        let mut chain = chain(mock);

        let reply = chain.respond("hello").await.unwrap();

        assert_eq!(reply, "reply");
        assert_eq!(chain.summary(), "");
    }

    #[tokio::test]
    async fn test_truncated_reply_is_still_returned() {
        let mock = Arc::new(MockLlmClient::new(vec![
            CompletionResponse::truncated("Deep learning is a branch of"),
            CompletionResponse::text("Human asked about deep learning."),
        ]));
        let mut chain = chain(mock.clone());

        let reply = chain.respond("tell me about deep learning").await.unwrap();

        assert_eq!(reply, "Deep learning is a branch of");
        assert_eq!(chain.summary(), "Human asked about deep learning.");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_reply_is_error() {
        let mock = Arc::new(MockLlmClient::with_texts(&["   "]));
        let mut chain = chain(mock.clone());

        let result = chain.respond("hello").await;

        assert!(matches!(result, Err(MemoryError::EmptyReply)));
        // No summary update after a failed reply
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_llm_failure_is_error() {
        let mock = Arc::new(MockLlmClient::new(vec![]));
        let mut chain = chain(mock);

        assert!(matches!(chain.respond("hello").await, Err(MemoryError::Llm(_))));
    }

    #[tokio::test]
    async fn test_clear_forgets_summary() {
        let mock = Arc::new(MockLlmClient::with_texts(&["reply", "summary"]));
        let mut chain = chain(mock);

        chain.respond("hello").await.unwrap();
        assert!(!chain.summary().is_empty());

        chain.clear();
        assert!(chain.summary().is_empty());
    }
}
