use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::{Classification, ClassifierError, SentimentClassifier};

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// VADER-style normalization constant for the compound score.
const ALPHA: f64 = 15.0;

/// Built-in word-list classifier (Spanish football vocabulary + common English).
#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (summed score, token count).
    /// A negator within the previous 1..=3 tokens flips the sign of a word.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
        }

        (score, tokens.len())
    }

    pub fn classify_one(&self, text: &str) -> Classification {
        let (sum, _) = self.score_text(text);
        let token = match sum.signum() {
            1 => "POS",
            -1 => "NEG",
            _ => "NEU",
        };
        Classification::new(token, Some(compound(sum)))
    }
}

/// Maps an unbounded sum into (-1, 1).
fn compound(sum: i32) -> f64 {
    let s = f64::from(sum);
    s / (s * s + ALPHA).sqrt()
}

#[async_trait::async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        Ok(texts.iter().map(|t| self.classify_one(t)).collect())
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "no" | "nunca" | "jamás" | "jamas" | "ni" | "tampoco" | "sin" | "not" | "never" | "without"
            | "cannot"
    )
}
