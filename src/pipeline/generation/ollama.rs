use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::time::Duration;

use super::ollama_types::{ChatChunk, ChatRequest, TagsResponse};
use super::GenerationError;

/// Preferred MedGemma models in order of preference.
const MEDGEMMA_MODELS: &[&str] = &[
    "medgemma",
    "medgemma:27b",
    "medgemma:4b",
    "medgemma:latest",
];

/// Generation capability boundary (allows mocking).
///
/// `chat_streaming` blocks until the model stops, pushing each text fragment
/// into `token_tx` as soon as it arrives. A dropped receiver means the
/// consumer went away; implementations stop forwarding and return `Ok`.
pub trait LlmClient {
    fn chat_streaming(
        &self,
        request: &ChatRequest,
        token_tx: Sender<String>,
    ) -> Result<(), GenerationError>;

    fn list_models(&self) -> Result<Vec<String>, GenerationError>;
}

/// Installed name of the first preferred MedGemma variant.
///
/// Returns the tag Ollama reports (`medgemma:4b`), never the bare preference
/// prefix, which Ollama would resolve to `:latest`.
pub fn find_best_model(client: &dyn LlmClient) -> Result<String, GenerationError> {
    let available = client.list_models()?;
    MEDGEMMA_MODELS
        .iter()
        .find_map(|preferred| available.iter().find(|m| m.starts_with(preferred)).cloned())
        .ok_or(GenerationError::NoModelAvailable)
}

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Only the connect phase is bounded: a generation may legitimately
    /// stream for minutes on CPU.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(None)
            .build()
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_connect() {
            GenerationError::Connection(self.base_url.clone())
        } else {
            GenerationError::Http(e.to_string())
        }
    }
}

impl LlmClient for OllamaClient {
    fn chat_streaming(
        &self,
        request: &ChatRequest,
        token_tx: Sender<String>,
    ) -> Result<(), GenerationError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let fragments = forward_ndjson(BufReader::new(response), &token_tx)?;
        tracing::debug!(model = %request.model, fragments, "Ollama chat stream finished");
        Ok(())
    }

    fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TagsResponse = response
            .json()
            .map_err(|e| GenerationError::MalformedChunk(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Read an Ollama NDJSON chat stream, forwarding each non-empty content
/// fragment. Returns the number of fragments forwarded.
pub fn forward_ndjson<R: BufRead>(
    reader: R,
    token_tx: &Sender<String>,
) -> Result<usize, GenerationError> {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| GenerationError::Http(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }

        let chunk: ChatChunk = serde_json::from_str(&line)
            .map_err(|e| GenerationError::MalformedChunk(e.to_string()))?;

        if let Some(error) = chunk.error {
            return Err(GenerationError::Worker(error));
        }

        if let Some(message) = chunk.message {
            if !message.content.is_empty() {
                if token_tx.send(message.content).is_err() {
                    tracing::debug!(forwarded, "Fragment consumer dropped, stopping stream");
                    return Ok(forwarded);
                }
                forwarded += 1;
            }
        }

        if chunk.done {
            break;
        }
    }
    Ok(forwarded)
}

// ═══════════════════════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════════════════════

/// Mock LLM client. Replays scripted fragments, optionally failing mid-stream.
pub struct MockLlmClient {
    fragments: Vec<String>,
    /// Fail with this message after emitting `fail_after` fragments.
    failure: Option<(usize, String)>,
    available_models: Vec<String>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            failure: None,
            available_models: vec!["medgemma:latest".to_string()],
            calls: AtomicUsize::new(0),
        }
    }

    /// Split `text` into fixed-size character fragments.
    pub fn chunked(text: &str, chars_per_fragment: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let fragments: Vec<String> = chars
            .chunks(chars_per_fragment.max(1))
            .map(|c| c.iter().collect())
            .collect();
        let refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
        Self::new(&refs)
    }

    pub fn failing_after(mut self, fragments: usize, message: &str) -> Self {
        self.failure = Some((fragments, message.to_string()));
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmClient for MockLlmClient {
    fn chat_streaming(
        &self,
        _request: &ChatRequest,
        token_tx: Sender<String>,
    ) -> Result<(), GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for (i, fragment) in self.fragments.iter().enumerate() {
            if let Some((fail_after, message)) = &self.failure {
                if i == *fail_after {
                    return Err(GenerationError::Worker(message.clone()));
                }
            }
            if token_tx.send(fragment.clone()).is_err() {
                return Ok(());
            }
        }
        match &self.failure {
            Some((fail_after, message)) if *fail_after >= self.fragments.len() => {
                Err(GenerationError::Worker(message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        Ok(self.available_models.clone())
    }
}
