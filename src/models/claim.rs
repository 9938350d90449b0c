//! The health statement under review.

use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Health claim cannot be empty")]
    Empty,

    #[error("Health claim is {chars} characters long (limit {max})")]
    TooLong { chars: usize, max: usize },
}

/// A validated, trimmed health claim.
///
/// Immutable once accepted; length is measured in characters, not bytes,
/// so CJK claims get the same budget as Latin ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Claim(String);

impl Claim {
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self, ClaimError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ClaimError::Empty);
        }
        let chars = text.chars().count();
        if chars > max_chars {
            return Err(ClaimError::TooLong {
                chars,
                max: max_chars,
            });
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl AsRef<str> for Claim {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_trimmed() {
        let claim = Claim::parse("  Vitamin C cures colds \n", 5000).unwrap();
        assert_eq!(claim.as_str(), "Vitamin C cures colds");
    }

    #[test]
    fn blank_claim_rejected() {
        assert_eq!(Claim::parse("", 5000), Err(ClaimError::Empty));
        assert_eq!(Claim::parse(" \t\n", 5000), Err(ClaimError::Empty));
    }

    #[test]
    fn oversized_claim_rejected() {
        let long = "a".repeat(5001);
        assert_eq!(
            Claim::parse(&long, 5000),
            Err(ClaimError::TooLong {
                chars: 5001,
                max: 5000
            })
        );
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let text = "喝碱性水能防癌".repeat(10); // 70 chars, 210 bytes
        let claim = Claim::parse(&text, 70).unwrap();
        assert_eq!(claim.char_count(), 70);
    }
}
