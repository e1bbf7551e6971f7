// src/retrieval/nitter.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::{Lazy, OnceCell};
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use std::time::{Duration, Instant};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::{Engagement, RawPost, RetrievalBackend, RetrievalError};
use crate::config::NitterConfig;
use crate::query::QueryExpression;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_histogram!(
            "retrieval_instance_ms",
            "Time to fetch and parse one Nitter feed, in milliseconds."
        );
        describe_counter!(
            "retrieval_instance_errors_total",
            "Nitter instances that failed or returned an unparseable feed."
        );
    });
}

/// Aggregates public Nitter instances through their search RSS feed.
/// Instances are tried in order; the first one that yields a parseable feed wins.
pub struct NitterBackend {
    client: reqwest::Client,
    instances: Vec<String>,
}

impl NitterBackend {
    pub fn new(cfg: &NitterConfig) -> Result<Self, RetrievalError> {
        if cfg.instances.is_empty() {
            return Err(RetrievalError::NotConfigured("no nitter instances"));
        }
        ensure_metrics_described();
        let client = reqwest::Client::builder()
            .user_agent(concat!("player-sentiment-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            instances: cfg.instances.clone(),
        })
    }

    async fn fetch_feed(&self, base: &str, query: &QueryExpression) -> Result<String, RetrievalError> {
        let resp = self
            .client
            .get(format!("{base}/search/rss"))
            .query(&[("f", "tweets"), ("q", query.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(RetrievalError::Status {
                origin: base.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl RetrievalBackend for NitterBackend {
    async fn search(
        &self,
        query: &QueryExpression,
        limit: usize,
    ) -> Result<Vec<RawPost>, RetrievalError> {
        let mut last = String::new();
        for base in &self.instances {
            let t0 = Instant::now();
            let parsed = match self.fetch_feed(base, query).await {
                Ok(xml) => parse_search_rss(&xml),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(mut posts) => {
                    histogram!("retrieval_instance_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                    tracing::debug!(target: "retrieval", instance = %base, posts = posts.len(), "nitter feed parsed");
                    posts.truncate(limit);
                    return Ok(posts);
                }
                Err(e) => {
                    tracing::warn!(target: "retrieval", instance = %base, error = %e, "nitter instance failed");
                    counter!("retrieval_instance_errors_total").increment(1);
                    last = e.to_string();
                }
            }
        }
        Err(RetrievalError::AllInstancesFailed {
            tried: self.instances.len(),
            last,
        })
    }

    fn name(&self) -> &'static str {
        "nitter"
    }
}

/// Parse a Nitter `/search/rss` feed. Items without a status link or a
/// parseable date are skipped.
pub fn parse_search_rss(xml: &str) -> Result<Vec<RawPost>, RetrievalError> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).map_err(|e| RetrievalError::Parse(e.to_string()))?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let Some((handle, id)) = it.link.as_deref().and_then(split_status_link) else {
            continue;
        };
        let Some(timestamp) = it.pub_date.as_deref().and_then(parse_rfc2822) else {
            continue;
        };

        let title = it.title.as_deref().map(str::trim).unwrap_or_default();
        let body = if title.is_empty() {
            RE_TAGS
                .replace_all(it.description.as_deref().unwrap_or_default(), " ")
                .trim()
                .to_string()
        } else {
            title.to_string()
        };

        out.push(RawPost {
            url: format!("https://twitter.com/{handle}/status/{id}"),
            id,
            timestamp,
            author_handle: handle,
            body_text: html_escape::decode_html_entities(&body).to_string(),
            // The feed carries no counters.
            engagement: Engagement::default(),
        });
    }
    Ok(out)
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::from_timestamp(dt.unix_timestamp(), 0)
}

/// `https://host/<handle>/status/<id>#m` → (handle, id)
fn split_status_link(link: &str) -> Option<(String, String)> {
    let path = link.split_once("://").map_or(link, |(_, rest)| rest);
    let mut seg = path.split('/').skip(1);
    let handle = seg.next()?.trim();
    if seg.next()? != "status" {
        return None;
    }
    let id: String = seg
        .next()?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if handle.is_empty() || id.is_empty() {
        return None;
    }
    Some((handle.to_string(), id))
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
