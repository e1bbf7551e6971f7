// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod normalize;
pub mod query;
pub mod retrieval;
pub mod sentiment;
pub mod stopwords;

// ---- Re-exports for stable public API ----
pub use crate::analysis::{AnalysisReport, AnalysisResult, Analyzer, AnalyzerLimits, RunStatus};
pub use crate::api::create_router as router;
pub use crate::error::{AnalysisError, ErrorKind};
pub use crate::normalize::normalize_text;
pub use crate::query::{build_query, QueryExpression, QueryOptions, SearchCriteria};
pub use crate::sentiment::SentimentLabel;

use anyhow::Context;
use tracing::info;

/// Wire the configured backend and classifier into an `Analyzer`.
/// Both collaborators are built exactly once here.
pub fn build_analyzer(cfg: &config::AppConfig) -> anyhow::Result<Analyzer> {
    let backend = retrieval::build_backend(&cfg.retrieval).context("building retrieval backend")?;
    let classifier =
        sentiment::build_classifier(&cfg.sentiment).context("building sentiment classifier")?;
    info!(
        backend = backend.name(),
        classifier = classifier.name(),
        max_results = cfg.analysis.max_results,
        language = cfg.query.language.as_deref().unwrap_or("any"),
        "analyzer configured"
    );
    Ok(Analyzer::new(
        backend,
        classifier,
        cfg.query.clone(),
        AnalyzerLimits::from(&cfg.analysis),
    ))
}
