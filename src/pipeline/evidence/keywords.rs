use std::sync::LazyLock;

use regex::Regex;

/// Keywords kept for the search term.
const MAX_KEYWORDS: usize = 5;

/// Characters of raw claim used when no keyword survives.
const FALLBACK_CHARS: usize = 50;

/// Latin words of 3+ letters, or CJK runs of 2-4 ideographs.
static WORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z]{3,}|[\x{4e00}-\x{9fff}]{2,4}").expect("static pattern")
});

const STOPWORDS: &[&str] = &[
    "的", "了", "和", "是", "在", "我", "有", "他", "这", "个", "们", "中", "来", "上", "大",
    "为", "与", "会", "对", "可", "the", "a", "an", "is", "are", "was", "were", "be", "been",
    "can", "could", "will", "would", "should", "may", "might", "to", "of", "in", "for", "on",
    "with", "at", "by", "from",
];

/// Build a PubMed search term from a free-text claim.
///
/// First five non-stopword tokens in claim order, space-joined. Falls back to
/// the first 50 characters of the claim when tokenization finds nothing.
pub fn extract_keywords(claim: &str) -> String {
    let keywords: Vec<&str> = WORD_TOKEN
        .find_iter(claim)
        .map(|m| m.as_str())
        .filter(|token| !is_stopword(token))
        .take(MAX_KEYWORDS)
        .collect();

    if keywords.is_empty() {
        claim.chars().take(FALLBACK_CHARS).collect()
    } else {
        keywords.join(" ")
    }
}

fn is_stopword(token: &str) -> bool {
    let lower = token.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_claim_keeps_first_five_content_words() {
        let keywords =
            extract_keywords("Drinking alkaline water every day can prevent cancer and heart disease");
        assert_eq!(keywords, "Drinking alkaline water every day");
    }

    #[test]
    fn stopwords_are_case_insensitive() {
        assert_eq!(extract_keywords("The vaccine WILL alter DNA"), "vaccine alter DNA");
    }

    #[test]
    fn short_words_dropped() {
        assert_eq!(extract_keywords("Flu shots"), "Flu shots");
    }

    #[test]
    fn only_stopwords_and_short_words_fall_back_to_claim() {
        assert_eq!(extract_keywords("Is 5G ok for us"), "Is 5G ok for us");
    }

    #[test]
    fn cjk_runs_split_into_short_segments() {
        // trailing single ideograph is not a token
        assert_eq!(extract_keywords("喝碱性水能预防癌症"), "喝碱性水 能预防癌");
    }

    #[test]
    fn mixed_script_preserves_order() {
        assert_eq!(extract_keywords("维生素C cures 感冒"), "维生素 cures 感冒");
    }

    #[test]
    fn nothing_usable_falls_back_to_prefix() {
        let claim = format!("{}!", "1".repeat(80));
        assert_eq!(extract_keywords(&claim), "1".repeat(50));
    }
}
