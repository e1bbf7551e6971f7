//! # Query Builder
//! Pure translation of `SearchCriteria` into the search grammar understood by
//! the retrieval backends (Twitter/Nitter style operators).
//!
//! Shape of the output, in order:
//! - the OR group: `"Full Name"` alone, or
//!   `("Full Name" OR (First AND Club) OR (Last AND Club))`
//! - optional context group from `QueryOptions::context_terms`
//! - `since:` (inclusive `date_from`) and `until:` (exclusive, day after `date_to`)
//! - `lang:` and `-filter:retweets` when configured
//!
//! No I/O and no hidden state: identical inputs give identical strings.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of posts requested when the caller does not say.
pub const DEFAULT_RESULT_LIMIT: usize = 50;

fn default_result_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub subject_name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Inclusive last day of the range.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("subject name must not be empty")]
    EmptySubject,
    #[error("date_from {from} is after date_to {to}")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
    #[error("result limit must be greater than zero")]
    ZeroLimit,
    #[error("account handle must not be empty")]
    EmptyHandle,
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

impl SearchCriteria {
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            affiliation: None,
            date_from: None,
            date_to: None,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Range covering the `days` most recent days, `today` included.
    pub fn last_days(self, days: u32, today: NaiveDate) -> Self {
        let back = u64::from(days.max(1) - 1);
        let from = today.checked_sub_days(Days::new(back)).unwrap_or(today);
        self.date_range(Some(from), Some(today))
    }

    pub fn limit(mut self, result_limit: usize) -> Self {
        self.result_limit = result_limit;
        self
    }

    pub fn validate(&self) -> Result<(), CriteriaError> {
        if clean_term(&self.subject_name).is_empty() {
            return Err(CriteriaError::EmptySubject);
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(CriteriaError::InvertedDateRange { from, to });
            }
        }
        if self.result_limit == 0 {
            return Err(CriteriaError::ZeroLimit);
        }
        Ok(())
    }

    /// Requested limit bounded by the deployment maximum.
    pub fn effective_limit(&self, max_results: usize) -> usize {
        self.result_limit.min(max_results.max(1))
    }

    /// Affiliation without `"` and with whitespace collapsed; `None` when blank.
    pub fn affiliation_trimmed(&self) -> Option<String> {
        self.affiliation
            .as_deref()
            .map(clean_term)
            .filter(|a| !a.is_empty())
    }
}

/// Deployment-level knobs that shape every query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Single target language, e.g. `"es"`.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub exclude_reposts: bool,
    /// Extra OR group that every match must also satisfy, e.g. `["gol", "partido"]`.
    #[serde(default)]
    pub context_terms: Vec<String>,
}

/// Opaque query string in the backend grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QueryExpression(String);

impl QueryExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryExpression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn build_query(
    criteria: &SearchCriteria,
    options: &QueryOptions,
) -> Result<QueryExpression, CriteriaError> {
    criteria.validate()?;

    let subject = clean_term(&criteria.subject_name);
    let mut terms = vec![format!("\"{subject}\"")];

    if let Some(affiliation) = criteria.affiliation_trimmed() {
        let club = quote_if_spaced(&affiliation);
        let mut words = subject.split(' ');
        let first = words.next();
        let last = words.next_back();
        if let Some(first) = first {
            terms.push(format!("({first} AND {club})"));
        }
        if let (Some(first), Some(last)) = (first, last) {
            if !last.eq_ignore_ascii_case(first) {
                terms.push(format!("({last} AND {club})"));
            }
        }
    }

    let mut parts = vec![or_group(&terms)];

    let context: Vec<String> = options
        .context_terms
        .iter()
        .map(|t| clean_term(t))
        .filter(|t| !t.is_empty())
        .map(|t| quote_if_spaced(&t))
        .collect();
    if !context.is_empty() {
        parts.push(format!("({})", context.join(" OR ")));
    }

    if let Some(from) = criteria.date_from {
        parts.push(format!("since:{}", from.format("%Y-%m-%d")));
    }
    if let Some(to) = criteria.date_to {
        // `until:` excludes its own day.
        let until = to.checked_add_days(Days::new(1)).unwrap_or(to);
        parts.push(format!("until:{}", until.format("%Y-%m-%d")));
    }

    push_filters(&mut parts, options, true);
    Ok(QueryExpression(parts.join(" ")))
}

/// Query for the recent posts of a single account (`from:handle`).
pub fn build_timeline_query(
    handle: &str,
    options: &QueryOptions,
) -> Result<QueryExpression, CriteriaError> {
    let handle = handle.trim().trim_start_matches('@');
    if handle.is_empty() || handle.contains(char::is_whitespace) {
        return Err(CriteriaError::EmptyHandle);
    }
    let mut parts = vec![format!("from:{handle}")];
    push_filters(&mut parts, options, false);
    Ok(QueryExpression(parts.join(" ")))
}

fn push_filters(parts: &mut Vec<String>, options: &QueryOptions, with_language: bool) {
    if with_language {
        if let Some(lang) = options.language.as_deref().map(str::trim) {
            if !lang.is_empty() {
                parts.push(format!("lang:{lang}"));
            }
        }
    }
    if options.exclude_reposts {
        parts.push("-filter:retweets".to_string());
    }
}

fn or_group(terms: &[String]) -> String {
    match terms {
        [single] => single.clone(),
        _ => format!("({})", terms.join(" OR ")),
    }
}

/// Expects a `clean_term` value.
fn quote_if_spaced(s: &str) -> String {
    if s.contains(' ') {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}

/// Drops `"` so no value can unbalance a phrase, then collapses whitespace.
fn clean_term(s: &str) -> String {
    s.replace('"', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}
