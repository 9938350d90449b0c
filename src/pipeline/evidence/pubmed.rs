use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;

use super::types::SearchQuery;
use super::SearchError;
use crate::config::AppConfig;

/// Bibliographic search boundary (allows mocking).
pub trait LiteratureSearch {
    /// Id-search phase: identifiers, most relevant first.
    fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>, SearchError>;

    /// Detail-fetch phase: one batched call, raw efetch XML.
    fn fetch_records(&self, ids: &[String]) -> Result<String, SearchError>;
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// esearch query string for `query`.
pub fn esearch_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("db", "pubmed".to_string()),
        ("term", query.term.clone()),
        ("retmax", query.max_results.to_string()),
        ("retmode", "json".to_string()),
        ("sort", "relevance".to_string()),
    ];
    if let Some(days) = query.recency_days {
        params.push(("datetype", "pdat".to_string()));
        params.push(("reldate", days.to_string()));
    }
    params
}

/// efetch query string for a batch of PMIDs.
pub fn efetch_params(ids: &[String]) -> Vec<(&'static str, String)> {
    vec![
        ("db", "pubmed".to_string()),
        ("id", ids.join(",")),
        ("retmode", "xml".to_string()),
        ("rettype", "abstract".to_string()),
    ]
}

/// Parse an esearch JSON body into its id list.
pub fn parse_esearch_json(body: &str) -> Result<Vec<String>, SearchError> {
    let parsed: ESearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::MalformedResponse(e.to_string()))?;
    Ok(parsed.esearchresult.idlist)
}

/// NCBI E-utilities client.
pub struct PubMedClient {
    base_url: String,
    client: reqwest::blocking::Client,
    search_timeout: Duration,
    fetch_timeout: Duration,
}

impl PubMedClient {
    pub fn new(config: &AppConfig) -> Result<Self, SearchError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(format!(
                "{}/{}",
                crate::config::APP_NAME,
                crate::config::APP_VERSION
            ))
            .build()
            .map_err(|e| SearchError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.eutils_url.trim_end_matches('/').to_string(),
            client,
            search_timeout: config.search_timeout,
            fetch_timeout: config.fetch_timeout,
        })
    }

    fn get_text(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<String, SearchError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .timeout(timeout)
            .send()
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Service {
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| SearchError::Http(e.to_string()))
    }
}

impl LiteratureSearch for PubMedClient {
    fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>, SearchError> {
        let body = self.get_text("esearch.fcgi", &esearch_params(query), self.search_timeout)?;
        parse_esearch_json(&body)
    }

    fn fetch_records(&self, ids: &[String]) -> Result<String, SearchError> {
        self.get_text("efetch.fcgi", &efetch_params(ids), self.fetch_timeout)
    }
}

// ═══════════════════════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════════════════════

/// Mock search with scripted ids and efetch XML. `None` makes that phase fail.
pub struct MockSearch {
    ids: Option<Vec<String>>,
    xml: Option<String>,
    searches: AtomicUsize,
    fetches: AtomicUsize,
    last_query: Mutex<Option<SearchQuery>>,
}

impl MockSearch {
    pub fn new(ids: &[&str], xml: &str) -> Self {
        Self {
            ids: Some(ids.iter().map(|id| id.to_string()).collect()),
            xml: Some(xml.to_string()),
            searches: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn failing_search() -> Self {
        Self {
            ids: None,
            ..Self::new(&[], "")
        }
    }

    pub fn failing_fetch(ids: &[&str]) -> Self {
        Self {
            xml: None,
            ..Self::new(ids, "")
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }
}

impl LiteratureSearch for MockSearch {
    fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some(query.clone());
        }
        self.ids
            .clone()
            .ok_or_else(|| SearchError::Http("connection refused".into()))
    }

    fn fetch_records(&self, _ids: &[String]) -> Result<String, SearchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.xml
            .clone()
            .ok_or(SearchError::Service { status: 503 })
    }
}
