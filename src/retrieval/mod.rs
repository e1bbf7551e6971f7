// src/retrieval/mod.rs
//! Retrieval collaborator: one `RetrievalBackend` capability, one variant per
//! strategy, picked by `[retrieval] backend = "..."`.

pub mod fixture;
pub mod gateway;
pub mod nitter;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::{BackendKind, RetrievalConfig};
use crate::query::QueryExpression;

pub use fixture::{FixtureBackend, MemoryBackend};
pub use gateway::GatewayBackend;
pub use nitter::NitterBackend;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    #[serde(default)]
    pub replies: u64,
}

/// A post exactly as the backend returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub author_handle: String,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub engagement: Engagement,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{origin} returned status {status}")]
    Status { origin: String, status: u16 },
    #[error("could not parse backend response: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("all {tried} instances failed, last error: {last}")]
    AllInstancesFailed { tried: usize, last: String },
    #[error("backend not configured: {0}")]
    NotConfigured(&'static str),
}

#[async_trait::async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// At most `limit` posts matching `query`; may be empty.
    async fn search(
        &self,
        query: &QueryExpression,
        limit: usize,
    ) -> Result<Vec<RawPost>, RetrievalError>;
    fn name(&self) -> &'static str;
}

pub type DynBackend = Arc<dyn RetrievalBackend>;

pub fn build_backend(cfg: &RetrievalConfig) -> Result<DynBackend, RetrievalError> {
    let backend: DynBackend = match cfg.backend {
        BackendKind::Nitter => Arc::new(NitterBackend::new(&cfg.nitter)?),
        BackendKind::Gateway => {
            let g = cfg
                .gateway
                .as_ref()
                .ok_or(RetrievalError::NotConfigured("[retrieval.gateway] section missing"))?;
            Arc::new(GatewayBackend::new(g)?)
        }
        BackendKind::Fixture => {
            let f = cfg
                .fixture
                .as_ref()
                .ok_or(RetrievalError::NotConfigured("[retrieval.fixture] section missing"))?;
            Arc::new(FixtureBackend::new(&f.path))
        }
    };
    info!(target: "retrieval", backend = backend.name(), "retrieval backend ready");
    Ok(backend)
}
