//! Field extraction and normalization of free-text fact-check answers.

pub mod normalize;
pub mod prompt;
pub mod sections;
pub mod types;

pub use normalize::*;
pub use prompt::*;
pub use sections::*;
pub use types::*;
