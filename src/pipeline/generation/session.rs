use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::Serialize;

use super::ollama::LlmClient;
use super::ollama_types::ChatRequest;
use super::GenerationError;
use crate::pipeline::stream_guard::{StreamGuard, StreamGuardConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Running,
    Completed,
    Failed,
}

/// One in-flight generation.
///
/// The model runs on a dedicated worker thread and pushes fragments through an
/// unbounded channel; the session is the single consumer. Iterating yields
/// fragments in production order, each exactly once. [`finish`] drains what is
/// left, joins the worker and returns the assembled text or the worker's error.
///
/// Dropping a session early closes the channel (the worker stops forwarding)
/// and still joins the worker thread.
///
/// [`finish`]: GenerationSession::finish
pub struct GenerationSession {
    fragments: Option<Receiver<String>>,
    worker: Option<JoinHandle<Result<(), GenerationError>>>,
    guard: StreamGuard,
    assembled: String,
    state: SessionState,
    failure: Option<GenerationError>,
}

impl GenerationSession {
    /// Submit `request` to `llm` on a new worker thread.
    pub fn start(
        llm: Arc<dyn LlmClient + Send + Sync>,
        request: ChatRequest,
        guard_config: StreamGuardConfig,
    ) -> Self {
        let (token_tx, token_rx) = mpsc::channel::<String>();
        let worker = thread::spawn(move || llm.chat_streaming(&request, token_tx));

        Self {
            fragments: Some(token_rx),
            worker: Some(worker),
            guard: StreamGuard::new(guard_config),
            assembled: String::new(),
            state: SessionState::Running,
            failure: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Text consumed so far.
    pub fn assembled(&self) -> &str {
        &self.assembled
    }

    /// Drain remaining fragments, join the worker and return the full text.
    ///
    /// Empty text with `Ok` means the model stayed silent; that is not an
    /// error here and is left to the normalizer.
    pub fn finish(mut self) -> Result<String, GenerationError> {
        while self.next().is_some() {}
        self.settle();

        match self.failure.take() {
            Some(e) => {
                tracing::error!(error = %e, "Generation failed");
                Err(e)
            }
            None => {
                let text = std::mem::take(&mut self.assembled);
                tracing::info!(
                    fragments = self.guard.fragments_seen(),
                    chars = text.chars().count(),
                    "Generation completed"
                );
                Ok(text)
            }
        }
    }

    /// Close the channel, join the worker and fix the terminal state.
    /// Idempotent.
    fn settle(&mut self) {
        self.fragments = None;
        if let Some(handle) = self.worker.take() {
            let worker_error = match handle.join() {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(_) => Some(GenerationError::WorkerPanicked),
            };
            // A guard trip is the root cause; the worker only saw a closed channel.
            if self.failure.is_none() {
                self.failure = worker_error;
            }
        }
        self.state = if self.failure.is_some() {
            SessionState::Failed
        } else {
            SessionState::Completed
        };
    }
}

impl Iterator for GenerationSession {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let received = self.fragments.as_ref()?.recv();
        let Ok(fragment) = received else {
            // Worker finished (or died) and dropped its sender.
            self.settle();
            return None;
        };

        if let Err(cause) = self.guard.observe(&fragment) {
            tracing::warn!(
                cause = %cause,
                fragments = self.guard.fragments_seen(),
                "Degenerate generation detected, cancelling"
            );
            self.failure = Some(GenerationError::Degenerated {
                cause,
                partial_chars: self.assembled.chars().count(),
            });
            self.settle();
            return None;
        }

        self.assembled.push_str(&fragment);
        Some(fragment)
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.settle();
            if let Some(e) = &self.failure {
                tracing::debug!(error = %e, "Abandoned generation worker ended with error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::generation::ollama::MockLlmClient;
    use crate::pipeline::generation::ollama_types::GenerationOptions;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "medgemma".into(),
            messages: vec![],
            stream: true,
            options: GenerationOptions::greedy(800),
        }
    }

    fn start(client: MockLlmClient) -> GenerationSession {
        GenerationSession::start(Arc::new(client), request(), StreamGuardConfig::default())
    }

    #[test]
    fn fragments_arrive_in_order_and_concatenate() {
        let text = "[Credibility Score] 20\n[Risk Level] Dangerous\n[Risk Reason] Unproven.";
        let mut session = start(MockLlmClient::chunked(text, 4));

        let yielded: Vec<String> = session.by_ref().collect();
        assert!(yielded.len() > 1);
        assert_eq!(yielded.concat(), text);
        assert_eq!(session.assembled(), text);

        let finished = session.finish().unwrap();
        assert_eq!(finished, text);
    }

    #[test]
    fn finish_without_iterating_drains_everything() {
        let session = start(MockLlmClient::new(&["a", "b", "c"]));
        assert_eq!(session.finish().unwrap(), "abc");
    }

    #[test]
    fn silent_model_is_empty_ok() {
        let session = start(MockLlmClient::new(&[]));
        assert_eq!(session.finish().unwrap(), "");
    }

    #[test]
    fn mid_stream_failure_surfaces_after_partial_fragments() {
        let mut session = start(MockLlmClient::new(&["one", "two", "three"]).failing_after(2, "runner crashed"));
        let yielded: Vec<String> = session.by_ref().collect();
        assert_eq!(yielded, vec!["one", "two"]);

        let err = session.finish().unwrap_err();
        assert!(matches!(err, GenerationError::Worker(ref m) if m == "runner crashed"));
    }

    #[test]
    fn failure_before_any_fragment_is_not_silence() {
        let session = start(MockLlmClient::new(&["x"]).failing_after(0, "boom"));
        assert!(matches!(session.finish(), Err(GenerationError::Worker(_))));
    }

    #[test]
    fn state_tracks_lifecycle() {
        let mut session = start(MockLlmClient::new(&["a"]));
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.next().as_deref(), Some("a"));
        assert_eq!(session.next(), None);
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.finish().unwrap(), "a");
    }

    #[test]
    fn worker_error_marks_state_failed() {
        let mut session = start(MockLlmClient::new(&["a"]).failing_after(1, "late"));
        while session.next().is_some() {}
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn degenerate_stream_is_cancelled() {
        let looping: Vec<&str> = std::iter::repeat("again").take(200).collect();
        let mut session = GenerationSession::start(
            Arc::new(MockLlmClient::new(&looping)),
            request(),
            StreamGuardConfig {
                max_identical_run: 10,
                ..StreamGuardConfig::default()
            },
        );
        let yielded = session.by_ref().count();
        assert_eq!(yielded, 9);
        assert_eq!(session.state(), SessionState::Failed);

        let err = session.finish().unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Degenerated { partial_chars: 45, .. }
        ));
    }

    #[test]
    fn finish_joins_worker() {
        let client = Arc::new(MockLlmClient::new(&["a", "b"]));
        let session =
            GenerationSession::start(client.clone(), request(), StreamGuardConfig::default());
        assert_eq!(session.finish().unwrap(), "ab");
        assert_eq!(Arc::strong_count(&client), 1);
    }

    #[test]
    fn failed_finish_still_joins_worker() {
        let client = Arc::new(MockLlmClient::new(&["a"]).failing_after(1, "late"));
        let session =
            GenerationSession::start(client.clone(), request(), StreamGuardConfig::default());
        assert!(session.finish().is_err());
        assert_eq!(Arc::strong_count(&client), 1);
    }

    #[test]
    fn dropping_early_joins_worker() {
        let client = Arc::new(MockLlmClient::chunked(&"x".repeat(10_000), 1));
        let mut session = GenerationSession::start(
            client.clone(),
            request(),
            StreamGuardConfig {
                max_identical_run: usize::MAX,
                max_fragments: usize::MAX,
                ..StreamGuardConfig::default()
            },
        );
        assert_eq!(session.next().as_deref(), Some("x"));
        drop(session);
        // Worker has been joined, so the Arc is no longer shared with it.
        assert_eq!(Arc::strong_count(&client), 1);
        assert_eq!(client.call_count(), 1);
    }
}
