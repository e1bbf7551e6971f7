//! Text normalization for classifier input and term counting.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::stopwords::is_stopword;

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-z][a-z0-9+.\-]*://\S+").expect("url regex"));
/// `@` must start the text or follow a non-word char, so e-mail addresses survive.
static RE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])@\w+").expect("mention regex"));
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").expect("tag regex"));
static RE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\r|\n").expect("newline regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Minimum length (in chars) of a counted term.
pub const MIN_TERM_CHARS: usize = 3;

/// Strip links, mentions, and tags, fold whitespace, lowercase.
///
/// Steps run in a fixed order; link removal happens before whitespace folding
/// so the gaps it leaves are collapsed too.
pub fn normalize_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    // 1) Links
    let out = RE_URL.replace_all(s, "");
    // 2) @mentions
    let out = RE_MENTION.replace_all(&out, "${1}");
    // 3) #tags
    let out = RE_TAG.replace_all(&out, "");
    // 4) Newlines
    let out = RE_NEWLINE.replace_all(&out, " ");
    // 5) Collapse whitespace
    let out = RE_WS.replace_all(&out, " ");

    out.trim().to_lowercase()
}

/// Countable terms of already-normalized text: alphanumeric runs of at least
/// `MIN_TERM_CHARS` chars that are neither stopwords nor pure numbers.
pub fn terms(normalized: &str) -> impl Iterator<Item = &str> + '_ {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .filter(|t| !t.chars().all(|c| c.is_numeric()))
        .filter(|t| !is_stopword(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_noise_and_lowercases() {
        let s = "Check http://x.co/a @user #tag\nNow";
        assert_eq!(normalize_text(s), "check now");
    }

    #[test]
    fn empty_is_ok() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t "), "");
    }

    #[test]
    fn terms_skip_stopwords_short_and_numeric() {
        let t: Vec<&str> = terms("qué golazo de messi en el minuto 90 ok").collect();
        assert_eq!(t, vec!["golazo", "messi", "minuto"]);
    }
}
