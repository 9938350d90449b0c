//! Streaming generation: drives the model on a background worker and hands
//! its fragments to exactly one consumer.

pub mod analyzer;
pub mod ollama;
pub mod ollama_types;
pub mod session;

pub use analyzer::*;
pub use ollama::*;
pub use ollama_types::*;
pub use session::*;

use thiserror::Error;

use crate::models::ClaimError;
use crate::pipeline::stream_guard::Degeneration;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Invalid claim: {0}")]
    InvalidClaim(#[from] ClaimError),

    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Malformed stream chunk: {0}")]
    MalformedChunk(String),

    #[error("Generation failed mid-stream: {0}")]
    Worker(String),

    #[error("Generation worker panicked")]
    WorkerPanicked,

    #[error("Generation aborted after {partial_chars} characters: {cause}")]
    Degenerated {
        cause: Degeneration,
        partial_chars: usize,
    },

    #[error("No compatible MedGemma model available")]
    NoModelAvailable,
}
