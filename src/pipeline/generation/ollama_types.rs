//! Wire types for Ollama's `/api/chat` and `/api/tags` endpoints.

use serde::{Deserialize, Serialize};

/// Streaming chat request for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Decoding options. Fact-checking uses greedy decoding with a hard length cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    /// 0.0 = greedy.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub num_predict: i32,
}

impl GenerationOptions {
    pub fn greedy(max_tokens: u32) -> Self {
        Self {
            temperature: 0.0,
            num_predict: i32::try_from(max_tokens).unwrap_or(i32::MAX),
        }
    }
}

/// One NDJSON line of a streaming `/api/chat` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub done: bool,
    /// Present when Ollama aborts the stream (model crash, OOM, ...).
    #[serde(default)]
    pub error: Option<String>,
}

/// Response body from Ollama `/api/tags`
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
pub struct TagModel {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_greedy_options() {
        let request = ChatRequest {
            model: "medgemma:4b".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            stream: true,
            options: GenerationOptions::greedy(800),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["options"]["temperature"], 0.0);
        assert_eq!(json["options"]["num_predict"], 800);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn chunk_with_content() {
        let line = r#"{"model":"medgemma","message":{"role":"assistant","content":"[Risk"},"done":false}"#;
        let chunk: ChatChunk = serde_json::from_str(line).unwrap();
        assert_eq!(chunk.message.unwrap().content, "[Risk");
        assert!(!chunk.done);
    }

    #[test]
    fn final_chunk_parses() {
        let line = r#"{"model":"medgemma","message":{"role":"assistant","content":""},"done":true,"total_duration":123}"#;
        let chunk: ChatChunk = serde_json::from_str(line).unwrap();
        assert!(chunk.done);
    }

    #[test]
    fn error_chunk_parses() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"error":"model runner crashed"}"#).unwrap();
        assert_eq!(chunk.error.as_deref(), Some("model runner crashed"));
        assert!(chunk.message.is_none());
    }

    #[test]
    fn oversized_token_limit_saturates() {
        assert_eq!(GenerationOptions::greedy(u32::MAX).num_predict, i32::MAX);
    }
}
