// src/retrieval/gateway.rs
//! JSON search gateway (e.g. a self-hosted bridge around an authenticated or
//! session-pooled scraper). Credentials are forwarded as given: an optional
//! bearer token and an optional `Cookie` header built from an exported
//! cookie file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use super::{RawPost, RetrievalBackend, RetrievalError};
use crate::config::GatewayConfig;
use crate::query::QueryExpression;

pub struct GatewayBackend {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    cookie_header: Option<String>,
}

#[derive(Serialize)]
struct SearchReq<'a> {
    query: &'a str,
    limit: usize,
}

/// Browser exports are either a name → value map or a list of cookie objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum CookieFile {
    Map(BTreeMap<String, String>),
    List(Vec<CookieEntry>),
}

#[derive(Deserialize)]
struct CookieEntry {
    name: String,
    value: String,
}

impl GatewayBackend {
    pub fn new(cfg: &GatewayConfig) -> Result<Self, RetrievalError> {
        let cookie_header = match cfg.cookies_file.as_deref() {
            Some(p) => Some(load_cookie_header(p)?),
            None => None,
        };
        let client = reqwest::Client::builder()
            .user_agent(concat!("player-sentiment-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            token: cfg.token.clone(),
            cookie_header: cookie_header.filter(|h| !h.is_empty()),
        })
    }
}

pub fn load_cookie_header(path: &Path) -> Result<String, RetrievalError> {
    let raw = std::fs::read_to_string(path)?;
    cookie_header_from_json(&raw)
}

/// `name=value` pairs joined with `; `, in file order (map exports sorted by name).
pub fn cookie_header_from_json(raw: &str) -> Result<String, RetrievalError> {
    let parsed: CookieFile =
        serde_json::from_str(raw).map_err(|e| RetrievalError::Parse(format!("cookie file: {e}")))?;
    let pairs: Vec<String> = match parsed {
        CookieFile::Map(m) => m.into_iter().map(|(k, v)| format!("{k}={v}")).collect(),
        CookieFile::List(l) => l
            .into_iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect(),
    };
    Ok(pairs.join("; "))
}

#[async_trait]
impl RetrievalBackend for GatewayBackend {
    async fn search(
        &self,
        query: &QueryExpression,
        limit: usize,
    ) -> Result<Vec<RawPost>, RetrievalError> {
        let mut req = self.client.post(&self.endpoint).json(&SearchReq {
            query: query.as_str(),
            limit,
        });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(cookies) = &self.cookie_header {
            req = req.header(reqwest::header::COOKIE, cookies);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(RetrievalError::Status {
                origin: "gateway".to_string(),
                status: resp.status().as_u16(),
            });
        }
        let body = resp.text().await?;
        let mut posts = super::fixture::parse_posts(&body)?;
        posts.truncate(limit);
        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "gateway"
    }
}
