use crate::models::RiskLevel;

use super::sections::{extract_list_items, extract_score, extract_section};
use super::types::{AnalysisResult, Section};

/// Characters of raw output shown when the model skipped the accuracy section.
const ACCURACY_FALLBACK_CHARS: usize = 500;

pub const RAW_OUTPUT_EMPTY: &str = "(empty)";

const FALLBACK_RISK_REASON: &str = "Not provided";
const FALLBACK_EVIDENCE: &str = "No evidence description found";
const FALLBACK_REBUTTAL: &str = "Consult a healthcare professional for more information.";
const FALLBACK_RECOMMENDATION: &str =
    "For health-related information, consult a qualified healthcare provider.";

/// Turn assembled model output into an [`AnalysisResult`]. Never fails.
///
/// Empty or whitespace-only output takes the total-failure path
/// ([`no_output_result`]). Otherwise each section is extracted on its own and
/// a missing section only affects its own field.
pub fn normalize(raw_text: &str) -> AnalysisResult {
    if raw_text.trim().is_empty() {
        tracing::warn!("Model produced no output; returning failure defaults");
        return no_output_result();
    }

    let section = |s: Section| extract_section(raw_text, s.label());

    let missing: Vec<&str> = Section::ALL
        .iter()
        .filter(|s| section(**s).is_empty())
        .map(Section::label)
        .collect();
    if !missing.is_empty() {
        tracing::debug!(missing = ?missing, "Sections missing from model output, using fallbacks");
    }

    AnalysisResult {
        credibility_score: extract_score(section(Section::CredibilityScore)),
        risk_level: resolve_risk_level(section(Section::RiskLevel)),
        risk_reason: or_fallback(section(Section::RiskReason), FALLBACK_RISK_REASON),
        medical_accuracy: match section(Section::MedicalAccuracy) {
            "" => raw_text
                .trim()
                .chars()
                .take(ACCURACY_FALLBACK_CHARS)
                .collect(),
            text => text.to_string(),
        },
        logical_fallacies: extract_list_items(section(Section::LogicalFallacies)),
        evidence_summary: or_fallback(section(Section::EvidenceSummary), FALLBACK_EVIDENCE),
        key_misconceptions: extract_list_items(section(Section::KeyMisconceptions)),
        rebuttal: or_fallback(section(Section::ScientificRebuttal), FALLBACK_REBUTTAL),
        recommendation: or_fallback(
            section(Section::ExpertRecommendation),
            FALLBACK_RECOMMENDATION,
        ),
        parse_error: false,
        raw_output: raw_text.to_string(),
    }
}

/// Fixed result for a run where the model emitted nothing.
pub fn no_output_result() -> AnalysisResult {
    AnalysisResult {
        credibility_score: 0,
        risk_level: RiskLevel::Misleading,
        risk_reason: "No output produced by the model; check that the generation service is \
                      running and the model is loaded."
            .to_string(),
        medical_accuracy: "Analysis failed; please try again.".to_string(),
        logical_fallacies: Vec::new(),
        evidence_summary: "Please verify against medical literature manually.".to_string(),
        key_misconceptions: Vec::new(),
        rebuttal: "This claim needs further verification; consult a healthcare professional."
            .to_string(),
        recommendation: FALLBACK_RECOMMENDATION.to_string(),
        parse_error: true,
        raw_output: RAW_OUTPUT_EMPTY.to_string(),
    }
}

/// First level, in priority order, named anywhere in the text (case-insensitive).
fn resolve_risk_level(text: &str) -> RiskLevel {
    let lower = text.to_lowercase();
    RiskLevel::PRIORITY
        .into_iter()
        .find(|level| lower.contains(&level.as_str().to_lowercase()))
        .unwrap_or_default()
}

fn or_fallback(extracted: &str, fallback: &str) -> String {
    if extracted.is_empty() {
        fallback.to_string()
    } else {
        extracted.to_string()
    }
}
