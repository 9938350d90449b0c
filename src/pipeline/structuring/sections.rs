//! Section slicing for the bracketed-label output contract.
//!
//! The model is asked to answer as `[Label] content` blocks. A section runs
//! from just after its first `[Label]` marker to the next bracketed marker of
//! any name, or to the end of the text. Markers are located with a plain
//! forward scan; nothing here backtracks.

use std::sync::LazyLock;

use regex::Regex;

/// Score used when no integer in 0..=100 appears in the section.
pub const DEFAULT_SCORE: u8 = 50;

/// Glyphs accepted as list bullets.
const BULLETS: &[char] = &['-', '•', '·', '*'];

/// Case-insensitive placeholders meaning "nothing to list".
const NEGATION_SENTINELS: &[&str] = &["none", "n/a", "na"];

static INTEGER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("static pattern"));

// ═══════════════════════════════════════════════════════════
// Section extraction
// ═══════════════════════════════════════════════════════════

/// Return the trimmed body of the first `[label]` section, or `""` if absent.
///
/// Matching is case-sensitive on the label. Sections may appear in any order
/// and the last one is terminated by end-of-text.
pub fn extract_section<'a>(text: &'a str, label: &str) -> &'a str {
    let marker = format!("[{label}]");
    let Some(start) = text.find(&marker) else {
        return "";
    };
    let body = &text[start + marker.len()..];
    let end = next_marker(body).unwrap_or(body.len());
    body[..end].trim()
}

/// Byte offset of the next `[...]` marker (at least one character between
/// the brackets) in `text`.
fn next_marker(text: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = text[from..].find('[') {
        let open = from + rel;
        let after = open + 1;
        match text[after..].find(']') {
            // "[]" is not a label; a later '[' may still open one.
            Some(0) => from = after,
            Some(_) => return Some(open),
            // No closing bracket anywhere further on means no more markers.
            None => return None,
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════
// Sub-extractors
// ═══════════════════════════════════════════════════════════

/// Split a section into list items.
///
/// Only bulleted lines count when any exist. Without bullets, a non-empty,
/// non-sentinel section becomes one implicit item.
pub fn extract_list_items(section: &str) -> Vec<String> {
    let bulleted: Vec<&str> = section
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(BULLETS))
        .collect();

    if bulleted.is_empty() {
        let whole = section.trim();
        if whole.is_empty() || is_sentinel(whole) {
            return Vec::new();
        }
        return vec![whole.to_string()];
    }

    bulleted
        .into_iter()
        .map(|line| line.trim_start_matches(|c: char| BULLETS.contains(&c) || c == ' ').trim())
        .filter(|item| !item.is_empty() && !is_sentinel(item))
        .map(str::to_string)
        .collect()
}

fn is_sentinel(text: &str) -> bool {
    let lower = text.to_lowercase();
    NEGATION_SENTINELS.contains(&lower.as_str())
}

/// First integer token within 0..=100, in encounter order.
///
/// Tolerates prose like "Score: 85/100". Negative numbers ("-5") are skipped
/// rather than read as 5.
pub fn extract_score(section: &str) -> u8 {
    INTEGER_TOKEN
        .find_iter(section)
        .filter(|m| !m.as_str().starts_with('-'))
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .find(|value| *value <= 100)
        .and_then(|value| u8::try_from(value).ok())
        .unwrap_or(DEFAULT_SCORE)
}
