//! Literature retrieval: keyword query, two-phase PubMed lookup and per-record
//! XML parsing. Failures degrade to an empty [`EvidenceSet`].

pub mod keywords;
pub mod parser;
pub mod pubmed;
pub mod retriever;
pub mod types;

pub use keywords::*;
pub use parser::*;
pub use pubmed::*;
pub use retriever::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Http(String),

    #[error("Search service returned status {status}")]
    Service { status: u16 },

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),
}
