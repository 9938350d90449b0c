use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::models::EvidenceStrength;

/// Journal-name fragments that mark an authoritative source.
const AUTHORITATIVE_SOURCES: &[&str] = &["WHO", "CDC", "NIH", "Nature", "Lancet", "NEJM"];

/// One PubMed citation.
///
/// Serializes with two derived fields, `author_line` and `strength`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteratureRecord {
    pub title: String,
    /// At most three "Surname Initials" entries.
    pub authors: Vec<String>,
    /// More than three authors were listed.
    pub authors_truncated: bool,
    pub journal: String,
    /// Four-digit year or `"N/A"`.
    pub year: String,
    pub pmid: String,
    /// At most 300 characters plus `"..."` when cut.
    pub abstract_text: String,
    /// Only present when `pmid` is non-empty.
    pub url: Option<String>,
}

impl LiteratureRecord {
    /// "Smith J, Doe A, Lee K, et al.", or "Unknown" without names.
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            return "Unknown".to_string();
        }
        let mut line = self.authors.join(", ");
        if self.authors_truncated {
            line.push_str(", et al.");
        }
        line
    }

    pub fn strength(&self) -> EvidenceStrength {
        if AUTHORITATIVE_SOURCES
            .iter()
            .any(|source| self.journal.contains(source))
        {
            EvidenceStrength::Strong
        } else {
            EvidenceStrength::Moderate
        }
    }
}

impl Serialize for LiteratureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LiteratureRecord", 10)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("authors", &self.authors)?;
        state.serialize_field("authors_truncated", &self.authors_truncated)?;
        state.serialize_field("author_line", &self.author_line())?;
        state.serialize_field("journal", &self.journal)?;
        state.serialize_field("year", &self.year)?;
        state.serialize_field("pmid", &self.pmid)?;
        state.serialize_field("abstract", &self.abstract_text)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("strength", &self.strength())?;
        state.end()
    }
}

/// Ordered literature found for one claim. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EvidenceSet {
    pub records: Vec<LiteratureRecord>,
}

impl EvidenceSet {
    pub fn new(records: Vec<LiteratureRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LiteratureRecord> {
        self.records.iter()
    }
}

/// Parameters of the id-search phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub max_results: usize,
    /// Restrict to publications from the last N days.
    pub recency_days: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(journal: &str, authors: &[&str], truncated: bool) -> LiteratureRecord {
        LiteratureRecord {
            title: "t".into(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            authors_truncated: truncated,
            journal: journal.into(),
            year: "2023".into(),
            pmid: "1".into(),
            abstract_text: String::new(),
            url: None,
        }
    }

    #[test]
    fn author_line_with_et_al() {
        let r = record("J", &["Smith J", "Doe A", "Lee K"], true);
        assert_eq!(r.author_line(), "Smith J, Doe A, Lee K, et al.");
    }

    #[test]
    fn author_line_without_authors() {
        assert_eq!(record("J", &[], false).author_line(), "Unknown");
    }

    #[test]
    fn authoritative_journal_is_strong() {
        assert_eq!(record("The Lancet. Oncology", &[], false).strength(), EvidenceStrength::Strong);
        assert_eq!(record("Nature medicine", &[], false).strength(), EvidenceStrength::Strong);
        assert_eq!(record("Nutrients", &[], false).strength(), EvidenceStrength::Moderate);
    }

    #[test]
    fn evidence_set_serializes_as_array() {
        let set = EvidenceSet::new(vec![record("J", &[], false)]);
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["abstract"], "");
    }

    #[test]
    fn serialized_record_carries_derived_fields() {
        let json = serde_json::to_value(record("NEJM", &["Smith J"], true)).unwrap();
        assert_eq!(json["author_line"], "Smith J, et al.");
        assert_eq!(json["strength"], "strong");
        assert_eq!(json["authors"][0], "Smith J");
        assert!(json.get("abstract_text").is_none());
    }
}
