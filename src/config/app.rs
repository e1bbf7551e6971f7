// src/config/app.rs
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::query::QueryOptions;

fn default_max_results() -> usize {
    200
}
fn default_top_terms() -> usize {
    10
}
fn default_top_posts() -> usize {
    10
}
fn default_retrieval_timeout_secs() -> u64 {
    30
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_classifier_timeout_secs() -> u64 {
    15
}
fn default_nitter_instances() -> Vec<String> {
    vec![
        "https://nitter.net".to_string(),
        "https://nitter.poast.org".to_string(),
        "https://nitter.privacydev.net".to_string(),
    ]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub query: QueryOptions,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Upper bound for `result_limit`; larger requests are clamped.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_top_terms")]
    pub top_terms: usize,
    #[serde(default = "default_top_posts")]
    pub top_posts: usize,
    /// Overall guard around one backend call.
    #[serde(default = "default_retrieval_timeout_secs")]
    pub retrieval_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            top_terms: default_top_terms(),
            top_posts: default_top_posts(),
            retrieval_timeout_secs: default_retrieval_timeout_secs(),
        }
    }
}

impl AnalysisConfig {
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Nitter,
    Gateway,
    Fixture,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub nitter: NitterConfig,
    #[serde(default)]
    pub gateway: Option<GatewayConfig>,
    #[serde(default)]
    pub fixture: Option<FixtureConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NitterConfig {
    /// Tried in order; the first instance that answers wins.
    #[serde(default = "default_nitter_instances")]
    pub instances: Vec<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NitterConfig {
    fn default() -> Self {
        Self {
            instances: default_nitter_instances(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub endpoint: String,
    /// Bearer token; "ENV" reads `PULSE_GATEWAY_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    /// Exported session cookies (JSON object or array of `{name, value}`).
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    #[default]
    Lexicon,
    Remote,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentConfig {
    #[serde(default)]
    pub classifier: ClassifierKind,
    #[serde(default)]
    pub remote: Option<RemoteClassifierConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteClassifierConfig {
    pub endpoint: String,
    /// "ENV" reads `SENTIMENT_API_TOKEN`.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_classifier_timeout_secs")]
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Replace out-of-range values with defaults.
    pub(crate) fn sanitize(&mut self) {
        let a = &mut self.analysis;
        if a.max_results == 0 {
            a.max_results = default_max_results();
        }
        if a.retrieval_timeout_secs == 0 {
            a.retrieval_timeout_secs = default_retrieval_timeout_secs();
        }

        let n = &mut self.retrieval.nitter;
        n.instances = n
            .instances
            .iter()
            .map(|i| i.trim().trim_end_matches('/').to_string())
            .filter(|i| !i.is_empty())
            .collect();
        if n.timeout_secs == 0 {
            n.timeout_secs = default_http_timeout_secs();
        }
        if let Some(g) = self.retrieval.gateway.as_mut() {
            if g.timeout_secs == 0 {
                g.timeout_secs = default_http_timeout_secs();
            }
        }
        if let Some(r) = self.sentiment.remote.as_mut() {
            if r.timeout_secs == 0 {
                r.timeout_secs = default_classifier_timeout_secs();
            }
        }

        let q = &mut self.query;
        q.language = q
            .language
            .take()
            .map(|l| l.trim().to_ascii_lowercase())
            .filter(|l| !l.is_empty());
    }
}
