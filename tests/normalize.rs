// tests/normalize.rs
use player_sentiment_analyzer::normalize::{normalize_text, terms};

const SAMPLES: &[&str] = &[
    "",
    "Check http://x.co/a @user #tag\nNow",
    "  GOLAZO   de   Messi!!  ",
    "Crack 🐐🔥 https://t.co/AbC123 la rompió\r\n\r\nVamos #InterMiami @MLS",
    "@a @b #c #d https://e.f/g",
    "email me: fan@club.com or #@odd @#odder",
    "ÑANDÚ İstanbul ΣΊΣΥΦΟΣ",
    "line1\rline2\nline3\r\nline4",
];

#[test]
fn strips_link_mention_and_tag() {
    assert_eq!(normalize_text("Check http://x.co/a @user #tag\nNow"), "check now");
}

#[test]
fn email_addresses_are_not_mentions() {
    assert_eq!(
        normalize_text("Escribí a fan@club.com, @prensa y (@mls)"),
        "escribí a fan@club.com, y ()"
    );
}

#[test]
fn empty_is_ok() {
    assert_eq!(normalize_text(""), "");
}

#[test]
fn no_match_is_trimmed_and_lowercased() {
    assert_eq!(normalize_text("  Gran Partido  "), "gran partido");
}

#[test]
fn removed_links_do_not_leave_double_spaces() {
    let n = normalize_text("Mirá https://t.co/1 https://t.co/2 esto");
    assert_eq!(n, "mirá esto");
    assert!(!n.contains("  "));
}

#[test]
fn newlines_become_spaces() {
    assert_eq!(normalize_text("line1\rline2\nline3\r\nline4"), "line1 line2 line3 line4");
}

#[test]
fn emoji_and_multibyte_survive() {
    let n = normalize_text("Crack 🐐🔥 https://t.co/AbC123 la rompió\r\n\r\nVamos #InterMiami @MLS");
    assert_eq!(n, "crack 🐐🔥 la rompió vamos");
}

#[test]
fn normalize_is_idempotent() {
    for s in SAMPLES {
        let once = normalize_text(s);
        assert_eq!(normalize_text(&once), once, "input: {s:?}");
    }
}

#[test]
fn terms_come_from_normalized_text() {
    let n = normalize_text("Qué GOLAZO de Messi, golazo!! https://t.co/x");
    let t: Vec<&str> = terms(&n).collect();
    assert_eq!(t, vec!["golazo", "messi", "golazo"]);
}
