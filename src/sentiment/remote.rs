//! HTTP classifier for Hugging Face style inference endpoints
//! (e.g. a pysentimiento model emitting POS/NEG/NEU).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Classification, ClassifierError, SentimentClassifier};
use crate::config::RemoteClassifierConfig;

pub struct RemoteClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct Req<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LabelScore {
    label: String,
    score: f64,
}

/// Some endpoints return a flat list when given a single input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Resp {
    Batch(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl RemoteClassifier {
    pub fn new(cfg: &RemoteClassifierConfig) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("player-sentiment-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            api_token: cfg.api_token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for RemoteClassifier {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut req = self.http.post(&self.endpoint).json(&Req { inputs: texts });
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(ClassifierError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;
        let parsed: Resp =
            serde_json::from_str(&body).map_err(|e| ClassifierError::Decode(e.to_string()))?;
        Ok(to_classifications(parsed, texts.len()))
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

pub(crate) fn to_classifications(resp: Resp, n_inputs: usize) -> Vec<Classification> {
    let rows = match resp {
        Resp::Batch(rows) => rows,
        // A flat list is one distribution for a single input, or one top label per input.
        Resp::Flat(flat) if n_inputs == 1 => vec![flat],
        Resp::Flat(flat) => flat.into_iter().map(|ls| vec![ls]).collect(),
    };
    rows.into_iter().map(top_label).collect()
}

fn top_label(candidates: Vec<LabelScore>) -> Classification {
    let best = candidates
        .into_iter()
        .filter(|c| c.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score));
    match best {
        Some(LabelScore { label, score }) => {
            let signed = match label.as_str() {
                "POS" => score,
                "NEG" => -score,
                _ => 0.0,
            };
            Classification::new(label, Some(signed))
        }
        None => Classification::new("NEU", None),
    }
}
