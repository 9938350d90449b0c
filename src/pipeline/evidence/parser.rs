use roxmltree::{Document, Node, ParsingOptions};
use thiserror::Error;

use super::types::LiteratureRecord;
use super::SearchError;

const MAX_AUTHORS: usize = 3;
const MAX_ABSTRACT_CHARS: usize = 300;
const UNKNOWN_JOURNAL: &str = "Unknown Journal";
const UNKNOWN_YEAR: &str = "N/A";

/// Why a single `PubmedArticle` was dropped.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("article has no title")]
    MissingTitle,
}

/// Parse an efetch response into records.
///
/// A document that is not XML fails as a whole; a malformed article is
/// skipped and the rest of the batch is kept.
pub fn parse_efetch_xml(xml: &str) -> Result<Vec<LiteratureRecord>, SearchError> {
    // efetch output carries a DOCTYPE declaration.
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

    let mut records = Vec::new();
    for (index, article) in doc
        .descendants()
        .filter(|n| n.has_tag_name("PubmedArticle"))
        .enumerate()
    {
        match parse_article(article) {
            Ok(record) => records.push(record),
            Err(e) => tracing::debug!(index, error = %e, "Skipping malformed PubMed article"),
        }
    }
    Ok(records)
}

/// Extract one citation from a `PubmedArticle` element.
pub fn parse_article(article: Node) -> Result<LiteratureRecord, RecordError> {
    let title = descendant(article, "ArticleTitle")
        .map(flatten_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(RecordError::MissingTitle)?;

    let author_nodes: Vec<Node> = article
        .descendants()
        .filter(|n| n.has_tag_name("Author"))
        .collect();
    let authors = author_nodes
        .iter()
        .take(MAX_AUTHORS)
        .filter_map(|author| format_author(*author))
        .collect();

    let journal = descendant(article, "Journal")
        .and_then(|j| child_text(j, "Title"))
        .unwrap_or_else(|| UNKNOWN_JOURNAL.to_string());

    let pmid = descendant(article, "PMID")
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    let url = (!pmid.is_empty()).then(|| format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"));

    Ok(LiteratureRecord {
        title,
        authors,
        authors_truncated: author_nodes.len() > MAX_AUTHORS,
        journal,
        year: publication_year(article),
        pmid,
        abstract_text: abstract_text(article),
        url,
    })
}

/// "Surname Initials"; authors without a surname (collectives) are skipped.
fn format_author(author: Node) -> Option<String> {
    let last = child_text(author, "LastName")?;
    let initials = child_text(author, "Initials").unwrap_or_default();
    Some(format!("{last} {initials}").trim().to_string())
}

/// `PubDate/Year`, else the first four characters of `PubDate/MedlineDate`.
fn publication_year(article: Node) -> String {
    let Some(pub_date) = descendant(article, "PubDate") else {
        return UNKNOWN_YEAR.to_string();
    };
    child_text(pub_date, "Year")
        .or_else(|| child_text(pub_date, "MedlineDate").map(|d| d.chars().take(4).collect()))
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
}

/// All `AbstractText` sections joined by a space, capped with an ellipsis.
fn abstract_text(article: Node) -> String {
    let joined = article
        .descendants()
        .filter(|n| n.has_tag_name("AbstractText"))
        .map(flatten_text)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.chars().count() > MAX_ABSTRACT_CHARS {
        let mut capped: String = joined.chars().take(MAX_ABSTRACT_CHARS).collect();
        capped.push_str("...");
        capped
    } else {
        joined
    }
}

fn descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| n.has_tag_name(name))
}

/// Trimmed, non-empty text of a direct child element.
fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .map(flatten_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Concatenate all text below `node`, dropping inline markup like `<i>`.
fn flatten_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
