use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedVerify";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medverify_lib=info,medverify=info,warn"
}

/// NCBI E-utilities base URL (esearch.fcgi / efetch.fcgi live under it).
pub const DEFAULT_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_MAX_CLAIM_CHARS: usize = 5000;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;
pub const DEFAULT_MAX_EVIDENCE: usize = 5;
/// ~5 years of publication dates.
pub const DEFAULT_RECENCY_DAYS: u32 = 1825;
/// NCBI allows 3 requests/second without an API key.
pub const DEFAULT_FETCH_DELAY_MS: u64 = 400;

// ═══════════════════════════════════════════════════════════
// Runtime configuration
// ═══════════════════════════════════════════════════════════

/// Every tunable of an analysis run.
///
/// Loaded from `MEDVERIFY_*` environment variables. Unparseable values are
/// logged and replaced by their default so a typo never stops the tool.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub ollama_url: String,
    /// `None` = pick the best installed MedGemma at startup.
    pub model: Option<String>,
    pub connect_timeout: Duration,
    pub max_claim_chars: usize,
    pub max_output_tokens: u32,
    pub max_evidence_results: usize,
    /// `None` disables the publication-date bias.
    pub recency_days: Option<u32>,
    pub eutils_url: String,
    pub search_timeout: Duration,
    pub fetch_timeout: Duration,
    pub fetch_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: None,
            connect_timeout: Duration::from_secs(10),
            max_claim_chars: DEFAULT_MAX_CLAIM_CHARS,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            max_evidence_results: DEFAULT_MAX_EVIDENCE,
            recency_days: Some(DEFAULT_RECENCY_DAYS),
            eutils_url: DEFAULT_EUTILS_URL.to_string(),
            search_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(15),
            fetch_delay: Duration::from_millis(DEFAULT_FETCH_DELAY_MS),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let recency_days = match parse_or(&get, "MEDVERIFY_RECENCY_DAYS", DEFAULT_RECENCY_DAYS) {
            0 => None,
            days => Some(days),
        };

        Self {
            ollama_url: get("MEDVERIFY_OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model: get("MEDVERIFY_MODEL"),
            connect_timeout: Duration::from_secs(parse_or(
                &get,
                "MEDVERIFY_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs(),
            )),
            max_claim_chars: parse_or(&get, "MEDVERIFY_MAX_CLAIM_CHARS", defaults.max_claim_chars),
            max_output_tokens: parse_or(
                &get,
                "MEDVERIFY_MAX_OUTPUT_TOKENS",
                defaults.max_output_tokens,
            ),
            max_evidence_results: parse_or(
                &get,
                "MEDVERIFY_MAX_EVIDENCE",
                defaults.max_evidence_results,
            ),
            recency_days,
            eutils_url: get("MEDVERIFY_EUTILS_URL").unwrap_or(defaults.eutils_url),
            search_timeout: Duration::from_secs(parse_or(
                &get,
                "MEDVERIFY_SEARCH_TIMEOUT_SECS",
                defaults.search_timeout.as_secs(),
            )),
            fetch_timeout: Duration::from_secs(parse_or(
                &get,
                "MEDVERIFY_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )),
            fetch_delay: Duration::from_millis(parse_or(
                &get,
                "MEDVERIFY_FETCH_DELAY_MS",
                DEFAULT_FETCH_DELAY_MS,
            )),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }),
    }
}
