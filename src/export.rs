// src/export.rs
//! CSV export of analysis results (RFC 4180 quoting, `,` separator).

use chrono::NaiveDate;
use std::io::{self, Write};

use crate::analysis::AnalysisResult;

pub const HEADER: [&str; 11] = [
    "id",
    "timestamp",
    "author_handle",
    "body_text",
    "normalized_text",
    "label",
    "score",
    "likes",
    "reposts",
    "replies",
    "url",
];

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\r\n")
}

pub fn write_results<W: Write>(w: &mut W, results: &[AnalysisResult]) -> io::Result<()> {
    write_row(w, &HEADER)?;
    for r in results {
        let p = &r.post;
        let row = [
            p.id.clone(),
            p.timestamp.to_rfc3339(),
            p.author_handle.clone(),
            p.body_text.clone(),
            r.normalized_text.clone(),
            r.label.as_str().to_string(),
            r.score.map(|s| format!("{s:.4}")).unwrap_or_default(),
            p.engagement.likes.to_string(),
            p.engagement.reposts.to_string(),
            p.engagement.replies.to_string(),
            p.url.clone(),
        ];
        write_row(w, &row)?;
    }
    Ok(())
}

pub fn results_to_csv(results: &[AnalysisResult]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_results(&mut buf, results);
    String::from_utf8(buf).unwrap_or_default()
}

/// `sentiment_<subject>_<YYYYMMDD>.csv`, subject reduced to `[a-z0-9_]`.
pub fn csv_filename(subject: &str, day: NaiveDate) -> String {
    let mut slug = String::with_capacity(subject.len());
    for c in subject.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '_' || c == '-') && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "export" } else { slug };
    format!("sentiment_{slug}_{}.csv", day.format("%Y%m%d"))
}
