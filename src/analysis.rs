//! # Analysis Aggregator
//! One run = build query → one retrieval call → one batch classification →
//! one aggregation pass. The backend and classifier are injected once and
//! shared read-only; each run owns its results exclusively.
//!
//! Retrieval problems degrade to an empty, valid report with a status flag.
//! Invalid criteria and classifier faults are returned as errors, and no
//! partially classified batch is ever exposed.

use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::normalize::{normalize_text, terms};
use crate::query::{
    build_query, build_timeline_query, CriteriaError, QueryExpression, QueryOptions, SearchCriteria,
};
use crate::retrieval::{DynBackend, RawPost, RetrievalError};
use crate::sentiment::{ClassifierError, DynClassifier, SentimentLabel};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("analysis_runs_total", "Analysis runs started.");
        describe_counter!("analysis_posts_total", "Posts classified across all runs.");
        describe_counter!(
            "retrieval_failures_total",
            "Runs degraded because the backend failed or timed out."
        );
        describe_counter!(
            "classification_failures_total",
            "Runs aborted by a classifier fault."
        );
        describe_histogram!("retrieval_ms", "Backend search time in milliseconds.");
    });
}

/// Per-post outcome; immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub post: RawPost,
    pub normalized_text: String,
    pub label: SentimentLabel,
    /// In `[-1.0, 1.0]` when present.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    NoResults { advisory: String },
    RetrievalFailed { advisory: String },
}

impl RunStatus {
    /// Same value as the serialized `status` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Ok => "ok",
            RunStatus::NoResults { .. } => "no_results",
            RunStatus::RetrievalFailed { .. } => "retrieval_failed",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RunStatus::Ok)
    }

    pub fn advisory(&self) -> Option<&str> {
        match self {
            RunStatus::Ok => None,
            RunStatus::NoResults { advisory } | RunStatus::RetrievalFailed { advisory } => {
                Some(advisory)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl LabelCounts {
    pub fn get(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
        }
    }

    fn bump(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }
}

/// Percent of total, rounded to one decimal place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LabelPercentages {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopTerms {
    pub positive: Vec<TermCount>,
    pub negative: Vec<TermCount>,
    pub neutral: Vec<TermCount>,
}

impl TopTerms {
    pub fn get(&self, label: SentimentLabel) -> &[TermCount] {
        match label {
            SentimentLabel::Positive => &self.positive,
            SentimentLabel::Negative => &self.negative,
            SentimentLabel::Neutral => &self.neutral,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub counts: LabelCounts,
    pub percentages: LabelPercentages,
    pub mean_score: Option<f64>,
    pub top_terms: TopTerms,
    /// Post ids, most liked first.
    pub top_posts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub status: RunStatus,
    pub query: String,
    pub results: Vec<AnalysisResult>,
    pub summary: Summary,
}

impl AnalysisReport {
    fn empty(query: &QueryExpression, status: RunStatus) -> Self {
        Self {
            status,
            query: query.to_string(),
            results: Vec::new(),
            summary: Summary::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerLimits {
    pub max_results: usize,
    pub top_terms: usize,
    pub top_posts: usize,
    pub retrieval_timeout: Duration,
}

impl Default for AnalyzerLimits {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalyzerLimits {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            max_results: cfg.max_results,
            top_terms: cfg.top_terms,
            top_posts: cfg.top_posts,
            retrieval_timeout: cfg.retrieval_timeout(),
        }
    }
}

const NO_RESULTS_ADVISORY: &str = "No posts found. Try only the last name, drop the affiliation, or widen the date range.";

/// Run-scoped filters that do not belong in the query string.
struct RunScope {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    /// Query words that would otherwise dominate every term list.
    excluded_terms: HashSet<String>,
}

pub struct Analyzer {
    backend: DynBackend,
    classifier: DynClassifier,
    options: QueryOptions,
    limits: AnalyzerLimits,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("backend", &self.backend.name())
            .field("classifier", &self.classifier.name())
            .field("options", &self.options)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Analyzer {
    pub fn new(
        backend: DynBackend,
        classifier: DynClassifier,
        options: QueryOptions,
        limits: AnalyzerLimits,
    ) -> Self {
        ensure_metrics_described();
        Self {
            backend,
            classifier,
            options,
            limits,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn limits(&self) -> &AnalyzerLimits {
        &self.limits
    }

    /// Dry run: the query a search would send.
    pub fn query_for(&self, criteria: &SearchCriteria) -> Result<QueryExpression, AnalysisError> {
        Ok(build_query(criteria, &self.options)?)
    }

    pub async fn run(&self, criteria: &SearchCriteria) -> Result<AnalysisReport, AnalysisError> {
        let query = build_query(criteria, &self.options)?;
        let limit = criteria.effective_limit(self.limits.max_results);
        if limit < criteria.result_limit {
            debug!(target: "analysis", requested = criteria.result_limit, limit, "result limit clamped");
        }

        let mut excluded_terms: HashSet<String> = HashSet::new();
        let subject = normalize_text(&criteria.subject_name);
        excluded_terms.extend(terms(&subject).map(str::to_string));
        if let Some(a) = criteria.affiliation_trimmed() {
            let a = normalize_text(&a);
            excluded_terms.extend(terms(&a).map(str::to_string));
        }

        let scope = RunScope {
            date_from: criteria.date_from,
            date_to: criteria.date_to,
            excluded_terms,
        };
        self.execute(query, limit, scope).await
    }

    /// Same pipeline over one account's recent posts.
    pub async fn timeline(&self, handle: &str, limit: usize) -> Result<AnalysisReport, AnalysisError> {
        let query = build_timeline_query(handle, &self.options)?;
        if limit == 0 {
            return Err(CriteriaError::ZeroLimit.into());
        }
        let limit = limit.min(self.limits.max_results.max(1));
        let scope = RunScope {
            date_from: None,
            date_to: None,
            excluded_terms: HashSet::new(),
        };
        self.execute(query, limit, scope).await
    }

    async fn execute(
        &self,
        query: QueryExpression,
        limit: usize,
        scope: RunScope,
    ) -> Result<AnalysisReport, AnalysisError> {
        counter!("analysis_runs_total").increment(1);
        let qid = query_id(query.as_str());

        let posts = match self.fetch(&query, limit).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(target: "analysis", %qid, backend = self.backend.name(), error = %e, "retrieval failed");
                counter!("retrieval_failures_total").increment(1);
                let advisory = format!("Could not retrieve posts ({}): {e}", self.backend.name());
                return Ok(AnalysisReport::empty(
                    &query,
                    RunStatus::RetrievalFailed { advisory },
                ));
            }
        };

        let posts = prepare_posts(posts, limit, &scope);
        if posts.is_empty() {
            info!(target: "analysis", %qid, "no results");
            return Ok(AnalysisReport::empty(
                &query,
                RunStatus::NoResults {
                    advisory: NO_RESULTS_ADVISORY.to_string(),
                },
            ));
        }

        let texts: Vec<String> = posts.iter().map(|p| normalize_text(&p.body_text)).collect();
        let classified = match self.classifier.classify(&texts).await {
            Ok(c) if c.len() == texts.len() => c,
            Ok(c) => {
                counter!("classification_failures_total").increment(1);
                return Err(ClassifierError::LengthMismatch {
                    expected: texts.len(),
                    got: c.len(),
                }
                .into());
            }
            Err(e) => {
                warn!(target: "analysis", %qid, classifier = self.classifier.name(), error = %e, "classification failed");
                counter!("classification_failures_total").increment(1);
                return Err(e.into());
            }
        };

        let results: Vec<AnalysisResult> = posts
            .into_iter()
            .zip(texts)
            .zip(classified)
            .map(|((post, normalized_text), c)| AnalysisResult {
                label: c.label(),
                score: c.score.filter(|s| s.is_finite()).map(|s| s.clamp(-1.0, 1.0)),
                post,
                normalized_text,
            })
            .collect();

        counter!("analysis_posts_total").increment(results.len() as u64);
        let summary = summarize(
            &results,
            self.limits.top_terms,
            self.limits.top_posts,
            &scope.excluded_terms,
        );
        info!(
            target: "analysis",
            %qid,
            total = summary.total,
            positive = summary.counts.positive,
            negative = summary.counts.negative,
            neutral = summary.counts.neutral,
            "analysis finished"
        );

        Ok(AnalysisReport {
            status: RunStatus::Ok,
            query: query.into_string(),
            results,
            summary,
        })
    }

    async fn fetch(&self, query: &QueryExpression, limit: usize) -> Result<Vec<RawPost>, AnalysisError> {
        let t0 = Instant::now();
        let timeout = self.limits.retrieval_timeout;
        let out = match tokio::time::timeout(timeout, self.backend.search(query, limit)).await {
            Ok(res) => res.map_err(AnalysisError::from),
            Err(_) => Err(RetrievalError::Timeout(timeout).into()),
        };
        histogram!("retrieval_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }
}

/// Dedup by id (first wins), keep posts inside the inclusive date range, cap at `limit`.
fn prepare_posts(posts: Vec<RawPost>, limit: usize, scope: &RunScope) -> Vec<RawPost> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .filter(|p| {
            let day = p.timestamp.date_naive();
            scope.date_from.map_or(true, |from| day >= from)
                && scope.date_to.map_or(true, |to| day <= to)
        })
        .take(limit)
        .collect()
}

/// Aggregate statistics over one batch of results.
pub fn summarize(
    results: &[AnalysisResult],
    top_terms: usize,
    top_posts: usize,
    excluded_terms: &HashSet<String>,
) -> Summary {
    let total = results.len();
    let mut counts = LabelCounts::default();
    for r in results {
        counts.bump(r.label);
    }

    let pct = |n: usize| {
        if total == 0 {
            0.0
        } else {
            round1(n as f64 * 100.0 / total as f64)
        }
    };
    let percentages = LabelPercentages {
        positive: pct(counts.positive),
        negative: pct(counts.negative),
        neutral: pct(counts.neutral),
    };

    let scores: Vec<f64> = results.iter().filter_map(|r| r.score).collect();
    let mean_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    let terms_for = |label: SentimentLabel| {
        top_terms_for(
            results.iter().filter(|r| r.label == label),
            top_terms,
            excluded_terms,
        )
    };
    let top_terms = TopTerms {
        positive: terms_for(SentimentLabel::Positive),
        negative: terms_for(SentimentLabel::Negative),
        neutral: terms_for(SentimentLabel::Neutral),
    };

    let mut by_popularity: Vec<&RawPost> = results.iter().map(|r| &r.post).collect();
    by_popularity.sort_by(|a, b| {
        (Reverse(a.engagement.likes), Reverse(a.engagement.reposts), &a.id).cmp(&(
            Reverse(b.engagement.likes),
            Reverse(b.engagement.reposts),
            &b.id,
        ))
    });
    let top_posts = by_popularity
        .into_iter()
        .take(top_posts)
        .map(|p| p.id.clone())
        .collect();

    Summary {
        total,
        counts,
        percentages,
        mean_score,
        top_terms,
        top_posts,
    }
}

fn top_terms_for<'a>(
    results: impl Iterator<Item = &'a AnalysisResult>,
    n: usize,
    excluded: &HashSet<String>,
) -> Vec<TermCount> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for r in results {
        for t in terms(&r.normalized_text) {
            if !excluded.contains(t) {
                *freq.entry(t).or_insert(0) += 1;
            }
        }
    }
    let mut all: Vec<(&str, usize)> = freq.into_iter().collect();
    all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    all.into_iter()
        .take(n)
        .map(|(term, count)| TermCount {
            term: term.to_string(),
            count,
        })
        .collect()
}

/// Half away from zero, one decimal.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Short anonymized id so logs never carry the raw query.
fn query_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
