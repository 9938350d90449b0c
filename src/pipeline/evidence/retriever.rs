use std::time::Duration;

use super::keywords::extract_keywords;
use super::parser::parse_efetch_xml;
use super::pubmed::LiteratureSearch;
use super::types::{EvidenceSet, LiteratureRecord, SearchQuery};
use super::SearchError;
use crate::config::AppConfig;

/// Typed result of one two-phase lookup.
#[derive(Debug)]
pub enum RetrievalOutcome {
    Found(Vec<LiteratureRecord>),
    /// The id-search returned nothing; detail-fetch was skipped.
    NoMatches,
    Failed(SearchError),
}

impl RetrievalOutcome {
    pub fn into_evidence(self) -> EvidenceSet {
        match self {
            RetrievalOutcome::Found(records) => EvidenceSet::new(records),
            RetrievalOutcome::NoMatches => EvidenceSet::default(),
            RetrievalOutcome::Failed(e) => {
                tracing::warn!(error = %e, "Evidence retrieval failed, continuing without literature");
                EvidenceSet::default()
            }
        }
    }
}

/// Claim → keywords → id-search → fixed delay → batched detail-fetch → records.
///
/// No retries. Every failure ends in an empty set.
pub struct EvidenceRetriever<S: LiteratureSearch> {
    search: S,
    max_results: usize,
    recency_days: Option<u32>,
    fetch_delay: Duration,
}

impl<S: LiteratureSearch> EvidenceRetriever<S> {
    pub fn new(search: S, config: &AppConfig) -> Self {
        Self {
            search,
            max_results: config.max_evidence_results,
            recency_days: config.recency_days,
            fetch_delay: config.fetch_delay,
        }
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    /// Literature for `claim`; empty on any failure.
    pub fn retrieve(&self, claim: &str) -> EvidenceSet {
        self.lookup(claim).into_evidence()
    }

    pub fn lookup(&self, claim: &str) -> RetrievalOutcome {
        let query = SearchQuery {
            term: extract_keywords(claim),
            max_results: self.max_results,
            recency_days: self.recency_days,
        };
        tracing::debug!(term_chars = query.term.chars().count(), "Searching PubMed");

        let ids = match self.search.search_ids(&query) {
            Ok(ids) => ids,
            Err(e) => return RetrievalOutcome::Failed(e),
        };
        if ids.is_empty() {
            tracing::info!("No PubMed matches");
            return RetrievalOutcome::NoMatches;
        }

        // E-utilities rate limit: stay under 3 requests per second.
        if !self.fetch_delay.is_zero() {
            std::thread::sleep(self.fetch_delay);
        }

        let outcome = self
            .search
            .fetch_records(&ids)
            .and_then(|xml| parse_efetch_xml(&xml));
        match outcome {
            Ok(records) => {
                tracing::info!(
                    ids = ids.len(),
                    records = records.len(),
                    "PubMed evidence retrieved"
                );
                RetrievalOutcome::Found(records)
            }
            Err(e) => RetrievalOutcome::Failed(e),
        }
    }
}
