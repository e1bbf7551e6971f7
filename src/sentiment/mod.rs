//! Sentiment collaborator: label mapping, classifier trait, and factory.
//!
//! Classifiers are built once at startup (`build_classifier`) and shared
//! read-only behind an `Arc` by every analysis run.

pub mod lexicon;
pub mod remote;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::{ClassifierKind, SentimentConfig};

pub use lexicon::LexiconClassifier;
pub use remote::RemoteClassifier;

/// Closed polarity set attached to every analyzed post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    /// `"POS"` and `"NEG"` are the only recognized tokens; anything else is neutral.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "POS" => SentimentLabel::Positive,
            "NEG" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POS",
            SentimentLabel::Negative => "NEG",
            SentimentLabel::Neutral => "NEU",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Raw classifier output for a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label_token: String,
    pub score: Option<f64>,
}

impl Classification {
    pub fn new(label_token: impl Into<String>, score: Option<f64>) -> Self {
        Self {
            label_token: label_token.into(),
            score,
        }
    }

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_token(&self.label_token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier endpoint returned status {0}")]
    Status(u16),
    #[error("could not decode classifier response: {0}")]
    Decode(String),
    #[error("classifier returned {got} results for {expected} texts")]
    LengthMismatch { expected: usize, got: usize },
    #[error("classifier not configured: {0}")]
    NotConfigured(&'static str),
}

/// Maps an ordered batch of normalized texts to labels, same length and order.
#[async_trait::async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>, ClassifierError>;
    fn name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn SentimentClassifier>;

/// Build the configured classifier.
pub fn build_classifier(cfg: &SentimentConfig) -> Result<DynClassifier, ClassifierError> {
    let client: DynClassifier = match cfg.classifier {
        ClassifierKind::Lexicon => Arc::new(LexiconClassifier::new()),
        ClassifierKind::Remote => {
            let remote = cfg
                .remote
                .as_ref()
                .ok_or(ClassifierError::NotConfigured("[sentiment.remote] section missing"))?;
            Arc::new(RemoteClassifier::new(remote)?)
        }
    };
    info!(target: "sentiment", classifier = client.name(), "sentiment classifier ready");
    Ok(client)
}
