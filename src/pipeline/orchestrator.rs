use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::evidence::{EvidenceRetriever, EvidenceSet, LiteratureSearch, PubMedClient};
use super::generation::{ClaimAnalyzer, GenerationError};
use super::structuring::{normalize, AnalysisResult};
use crate::models::{Claim, ClaimError, ConfidenceBand, RiskTier};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Final output of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub claim: Claim,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub analysis: AnalysisResult,
    /// Band of `analysis.credibility_score`.
    pub confidence: ConfidenceBand,
    /// Tier of `analysis.risk_level`.
    pub risk_tier: RiskTier,
    pub evidence: EvidenceSet,
}

/// Runs one claim through the whole core:
/// validate → (generate → normalize) ∥ evidence → report
///
/// Evidence retrieval runs on a scoped thread next to generation. Its wall time
/// is bounded by the search client's timeouts; a failed or panicked lookup
/// contributes an empty set.
pub struct Orchestrator<S: LiteratureSearch + Sync = PubMedClient> {
    analyzer: ClaimAnalyzer,
    retriever: Option<EvidenceRetriever<S>>,
}

impl<S: LiteratureSearch + Sync> Orchestrator<S> {
    /// The claim length limit is the analyzer's.
    pub fn new(analyzer: ClaimAnalyzer, retriever: Option<EvidenceRetriever<S>>) -> Self {
        Self {
            analyzer,
            retriever,
        }
    }

    /// Analyze `claim`, handing every generated fragment to `on_fragment` as it
    /// arrives.
    ///
    /// Only input validation and generation errors propagate. A silent model
    /// yields the `parse_error` result; evidence problems yield no evidence.
    pub fn analyze<F>(&self, claim: &str, mut on_fragment: F) -> Result<AnalysisReport, AnalysisError>
    where
        F: FnMut(&str),
    {
        let claim = Claim::parse(claim, self.analyzer.max_claim_chars())?;
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("analyze_claim", %run_id, claim_chars = claim.char_count());
        let _entered = span.enter();
        let started = Instant::now();

        let (generated, evidence) = thread::scope(|scope| {
            let evidence_task = self.retriever.as_ref().map(|retriever| {
                let span = span.clone();
                let claim = claim.as_str();
                scope.spawn(move || span.in_scope(|| retriever.retrieve(claim)))
            });

            let mut session = self.analyzer.start(&claim);
            for fragment in session.by_ref() {
                on_fragment(&fragment);
            }
            let generated = session.finish();

            let evidence = match evidence_task {
                Some(task) => task.join().unwrap_or_else(|_| {
                    tracing::warn!("Evidence worker panicked, continuing without literature");
                    EvidenceSet::default()
                }),
                None => EvidenceSet::default(),
            };
            (generated, evidence)
        });

        let analysis = normalize(&generated?);

        tracing::info!(
            score = analysis.credibility_score,
            risk = %analysis.risk_level,
            parse_error = analysis.parse_error,
            evidence = evidence.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisReport {
            run_id,
            claim,
            generated_at: Utc::now(),
            model: self.analyzer.model().to_string(),
            confidence: analysis.confidence(),
            risk_tier: analysis.risk_tier(),
            analysis,
            evidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AppConfig;
    use crate::models::RiskLevel;
    use crate::pipeline::evidence::MockSearch;
    use crate::pipeline::generation::MockLlmClient;

    const OUTPUT: &str = "[Credibility Score] 12/100\n\
        [Risk Level] Dangerous\n\
        [Risk Reason] Delays real treatment.\n\
        [Medical Accuracy] Water pH does not change blood pH.\n\
        [Logical Fallacies]\n- Appeal to nature\n- Anecdote\n\
        [Evidence Summary] No trials support it.\n\
        [Key Misconceptions]\n- Blood pH is diet-controlled\n\
        [Scientific Rebuttal] Kidneys and lungs regulate pH.\n\
        [Expert Recommendation] Follow oncologist advice.";

    const XML: &str = "<PubmedArticleSet><PubmedArticle><PMID>31</PMID>\
        <ArticleTitle>Alkaline diet and cancer</ArticleTitle>\
        <Journal><Title>BMJ Open</Title></Journal></PubmedArticle></PubmedArticleSet>";

    fn config() -> AppConfig {
        AppConfig {
            fetch_delay: std::time::Duration::ZERO,
            ..AppConfig::default()
        }
    }

    fn orchestrator(llm: Arc<MockLlmClient>, search: Option<MockSearch>) -> Orchestrator<MockSearch> {
        let config = config();
        Orchestrator::new(
            ClaimAnalyzer::new(llm, "medgemma", &config),
            search.map(|s| EvidenceRetriever::new(s, &config)),
        )
    }

    #[test]
    fn report_merges_analysis_and_evidence() {
        let llm = Arc::new(MockLlmClient::chunked(OUTPUT, 7));
        let orch = orchestrator(llm, Some(MockSearch::new(&["31"], XML)));

        let mut streamed = String::new();
        let report = orch
            .analyze("Alkaline water cures cancer", |f| streamed.push_str(f))
            .unwrap();

        assert_eq!(streamed, OUTPUT);
        assert_eq!(report.claim.as_str(), "Alkaline water cures cancer");
        assert_eq!(report.model, "medgemma");
        assert_eq!(report.analysis.credibility_score, 12);
        assert_eq!(report.analysis.risk_level, RiskLevel::Dangerous);
        assert_eq!(report.analysis.logical_fallacies.len(), 2);
        assert!(!report.analysis.parse_error);
        assert_eq!(report.evidence.len(), 1);
        assert_eq!(report.evidence.records[0].pmid, "31");
    }

    #[test]
    fn evidence_failure_does_not_fail_analysis() {
        let llm = Arc::new(MockLlmClient::chunked(OUTPUT, 20));
        let orch = orchestrator(llm, Some(MockSearch::failing_search()));
        let report = orch.analyze("Alkaline water cures cancer", |_| {}).unwrap();
        assert!(report.evidence.is_empty());
        assert_eq!(report.analysis.credibility_score, 12);
    }

    #[test]
    fn silent_model_yields_failure_defaults() {
        let orch = orchestrator(Arc::new(MockLlmClient::new(&[])), None);
        let report = orch.analyze("Garlic cures flu", |_| {}).unwrap();
        assert!(report.analysis.parse_error);
        assert_eq!(report.analysis.credibility_score, 0);
        assert_eq!(report.analysis.raw_output, "(empty)");
    }

    #[test]
    fn generation_error_propagates() {
        let llm = Arc::new(MockLlmClient::new(&["[Credibility"]).failing_after(1, "out of memory"));
        let orch = orchestrator(llm, Some(MockSearch::new(&["31"], XML)));
        let result = orch.analyze("Garlic cures flu", |_| {});
        assert!(matches!(
            result,
            Err(AnalysisError::Generation(GenerationError::Worker(_)))
        ));
    }

    #[test]
    fn invalid_claim_starts_nothing() {
        let llm = Arc::new(MockLlmClient::new(&["unused"]));
        let orch = orchestrator(llm.clone(), Some(MockSearch::new(&["31"], XML)));

        let result = orch.analyze("  \n ", |_| {});
        assert!(matches!(result, Err(AnalysisError::Claim(ClaimError::Empty))));
        assert_eq!(llm.call_count(), 0);
        assert_eq!(orch.retriever.as_ref().unwrap().search().search_count(), 0);
    }

    #[test]
    fn evidence_disabled() {
        let orch = orchestrator(Arc::new(MockLlmClient::new(&["[Risk Level] Safe"])), None);
        let report = orch.analyze("Sleep helps recovery", |_| {}).unwrap();
        assert!(report.evidence.is_empty());
        assert_eq!(report.analysis.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn report_serializes_with_evidence_array() {
        let orch = orchestrator(
            Arc::new(MockLlmClient::new(&[OUTPUT])),
            Some(MockSearch::new(&["31"], XML)),
        );
        let report = orch.analyze("Alkaline water cures cancer", |_| {}).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["claim"], "Alkaline water cures cancer");
        assert_eq!(json["analysis"]["risk_level"], "Dangerous");
        assert_eq!(json["evidence"][0]["url"], "https://pubmed.ncbi.nlm.nih.gov/31/");
        assert!(json["run_id"].is_string());
        assert_eq!(json["confidence"], "low");
        assert_eq!(json["risk_tier"], "high");
        assert_eq!(json["evidence"][0]["author_line"], "Unknown");
        assert_eq!(json["evidence"][0]["strength"], "moderate");
    }

    #[test]
    fn claim_limit_comes_from_analyzer() {
        let llm = Arc::new(MockLlmClient::new(&["unused"]));
        let config = AppConfig {
            max_claim_chars: 10,
            ..config()
        };
        let orch: Orchestrator<MockSearch> =
            Orchestrator::new(ClaimAnalyzer::new(llm.clone(), "medgemma", &config), None);

        let result = orch.analyze("Garlic cures the flu", |_| {});
        assert!(matches!(
            result,
            Err(AnalysisError::Claim(ClaimError::TooLong { chars: 20, max: 10 }))
        ));
        assert_eq!(llm.call_count(), 0);
    }
}
