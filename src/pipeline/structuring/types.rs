use serde::Serialize;

use crate::models::{ConfidenceBand, RiskLevel, RiskTier};

/// One bracketed section of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    CredibilityScore,
    RiskLevel,
    RiskReason,
    MedicalAccuracy,
    LogicalFallacies,
    EvidenceSummary,
    KeyMisconceptions,
    ScientificRebuttal,
    ExpertRecommendation,
}

impl Section {
    /// Canonical order, as presented to the model.
    pub const ALL: [Section; 9] = [
        Self::CredibilityScore,
        Self::RiskLevel,
        Self::RiskReason,
        Self::MedicalAccuracy,
        Self::LogicalFallacies,
        Self::EvidenceSummary,
        Self::KeyMisconceptions,
        Self::ScientificRebuttal,
        Self::ExpertRecommendation,
    ];

    /// Exact label between the brackets.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CredibilityScore => "Credibility Score",
            Self::RiskLevel => "Risk Level",
            Self::RiskReason => "Risk Reason",
            Self::MedicalAccuracy => "Medical Accuracy",
            Self::LogicalFallacies => "Logical Fallacies",
            Self::EvidenceSummary => "Evidence Summary",
            Self::KeyMisconceptions => "Key Misconceptions",
            Self::ScientificRebuttal => "Scientific Rebuttal",
            Self::ExpertRecommendation => "Expert Recommendation",
        }
    }

    /// Answer instructions for this section.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::CredibilityScore => "An integer 0-100 (0=completely false, 100=fully credible)",
            Self::RiskLevel => "Exactly one of: Safe, Misleading, Dangerous",
            Self::RiskReason => "1-2 sentences explaining why this risk level was assigned",
            Self::MedicalAccuracy => {
                "Assess the claim's accuracy from a medical science perspective (2-4 sentences)"
            }
            Self::LogicalFallacies => {
                "List any logical errors in the claim (each item starting with \"-\", or \"None\" if none)"
            }
            Self::EvidenceSummary => {
                "How current medical evidence supports or contradicts the claim (2-3 sentences)"
            }
            Self::KeyMisconceptions => {
                "The most important misconceptions in the claim (each item starting with \"-\", or \"None\" if none)"
            }
            Self::ScientificRebuttal => {
                "A science-based rebuttal suitable for social media (100-150 words, clear language)"
            }
            Self::ExpertRecommendation => {
                "Practical health advice for the general user (1-2 sentences)"
            }
        }
    }
}

/// Normalized fact-check of one claim.
///
/// Every text field is non-empty; only the two list fields may be empty.
/// `parse_error` is set solely when the model produced no output at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub credibility_score: u8,
    pub risk_level: RiskLevel,
    pub risk_reason: String,
    pub medical_accuracy: String,
    pub logical_fallacies: Vec<String>,
    pub evidence_summary: String,
    pub key_misconceptions: Vec<String>,
    pub rebuttal: String,
    pub recommendation: String,
    pub parse_error: bool,
    /// Unmodified model output, or `"(empty)"` on the failure path.
    pub raw_output: String,
}

impl AnalysisResult {
    pub fn confidence(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.credibility_score)
    }

    pub fn risk_tier(&self) -> RiskTier {
        self.risk_level.tier()
    }
}
