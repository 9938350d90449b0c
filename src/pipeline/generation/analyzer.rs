use std::sync::Arc;

use super::ollama::LlmClient;
use super::ollama_types::{ChatMessage, ChatRequest, GenerationOptions};
use super::session::GenerationSession;
use super::GenerationError;
use crate::config::AppConfig;
use crate::models::Claim;
use crate::pipeline::stream_guard::StreamGuardConfig;
use crate::pipeline::structuring::{build_fact_check_prompt, FACT_CHECK_SYSTEM_PROMPT};

/// Streaming fact-check entry point.
///
/// Holds the process-wide generation client (built once, shared by `Arc`)
/// and turns a claim into a running [`GenerationSession`].
pub struct ClaimAnalyzer {
    llm: Arc<dyn LlmClient + Send + Sync>,
    model: String,
    options: GenerationOptions,
    max_claim_chars: usize,
    guard_config: StreamGuardConfig,
}

impl ClaimAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, model: &str, config: &AppConfig) -> Self {
        Self {
            llm,
            model: model.to_string(),
            options: GenerationOptions::greedy(config.max_output_tokens),
            max_claim_chars: config.max_claim_chars,
            guard_config: StreamGuardConfig::default(),
        }
    }

    pub fn with_guard(mut self, guard_config: StreamGuardConfig) -> Self {
        self.guard_config = guard_config;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_claim_chars(&self) -> usize {
        self.max_claim_chars
    }

    /// Validate `claim` and start generating. Invalid input fails before any
    /// worker is spawned.
    pub fn run_analysis(&self, claim: &str) -> Result<GenerationSession, GenerationError> {
        let claim = Claim::parse(claim, self.max_claim_chars)?;
        Ok(self.start(&claim))
    }

    /// Start generating for an already validated claim.
    pub fn start(&self, claim: &Claim) -> GenerationSession {
        tracing::info!(
            model = %self.model,
            claim_chars = claim.char_count(),
            max_tokens = self.options.num_predict,
            "Starting fact-check generation"
        );
        GenerationSession::start(
            Arc::clone(&self.llm),
            self.build_request(claim),
            self.guard_config.clone(),
        )
    }

    fn build_request(&self, claim: &Claim) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(FACT_CHECK_SYSTEM_PROMPT),
                ChatMessage::user(build_fact_check_prompt(claim.as_str())),
            ],
            stream: true,
            options: self.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClaimError;
    use crate::pipeline::generation::ollama::MockLlmClient;

    fn analyzer(client: Arc<MockLlmClient>) -> ClaimAnalyzer {
        ClaimAnalyzer::new(client, "medgemma", &AppConfig::default())
    }

    #[test]
    fn empty_claim_rejected_without_generation() {
        let client = Arc::new(MockLlmClient::new(&["unused"]));
        let result = analyzer(client.clone()).run_analysis("   ");
        assert!(matches!(
            result,
            Err(GenerationError::InvalidClaim(ClaimError::Empty))
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn oversized_claim_rejected() {
        let client = Arc::new(MockLlmClient::new(&[]));
        let long = "a".repeat(5001);
        assert!(matches!(
            analyzer(client.clone()).run_analysis(&long),
            Err(GenerationError::InvalidClaim(ClaimError::TooLong { .. }))
        ));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn stream_concatenation_equals_finished_text() {
        let text = "[Credibility Score] 5\n[Risk Level] Dangerous";
        let client = Arc::new(MockLlmClient::chunked(text, 3));
        let mut session = analyzer(client.clone()).run_analysis("Bleach cures flu").unwrap();

        let streamed: String = session.by_ref().collect();
        let finished = session.finish().unwrap();
        assert_eq!(streamed, finished);
        assert_eq!(finished, text);
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn request_has_two_messages_and_greedy_decoding() {
        let client = Arc::new(MockLlmClient::new(&[]));
        let analyzer = analyzer(client);
        let claim = Claim::parse("Coffee dehydrates you", 5000).unwrap();
        let request = analyzer.build_request(&claim);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert!(request.messages[1].content.contains("Coffee dehydrates you"));
        assert!(request.messages[1].content.contains("[Expert Recommendation]"));
        assert!(request.stream);
        assert_eq!(request.options.temperature, 0.0);
        assert_eq!(request.options.num_predict, 800);
    }
}
