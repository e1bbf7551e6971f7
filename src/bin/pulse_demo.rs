//! Demo: one analysis run over a fixture file (first argument) or a few
//! built-in posts, printed as a summary on stdout.

use std::sync::Arc;

use chrono::{Duration, Utc};
use player_sentiment_analyzer::retrieval::{
    DynBackend, Engagement, FixtureBackend, MemoryBackend, RawPost,
};
use player_sentiment_analyzer::sentiment::LexiconClassifier;
use player_sentiment_analyzer::{Analyzer, AnalyzerLimits, QueryOptions, SearchCriteria};

fn sample_posts() -> Vec<RawPost> {
    let now = Utc::now();
    let texts = [
        ("1", "Qué golazo de Messi, un crack total https://t.co/abc #Inter", 420),
        ("2", "@hincha Partido pésimo, un desastre en defensa", 35),
        ("3", "Messi juega el domingo contra Orlando", 12),
        ("4", "No fue un desastre, asistencia brillante de Messi", 210),
    ];
    texts
        .iter()
        .enumerate()
        .map(|(i, (id, text, likes))| RawPost {
            id: id.to_string(),
            timestamp: now - Duration::hours(i as i64),
            author_handle: format!("fan{id}"),
            body_text: text.to_string(),
            url: format!("https://twitter.com/fan{id}/status/{id}"),
            engagement: Engagement {
                likes: *likes,
                reposts: 0,
                replies: 0,
            },
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let backend: DynBackend = match std::env::args().nth(1) {
        Some(path) => Arc::new(FixtureBackend::new(path)),
        None => Arc::new(MemoryBackend::new(sample_posts())),
    };
    let options = QueryOptions {
        language: Some("es".into()),
        exclude_reposts: true,
        ..QueryOptions::default()
    };
    let analyzer = Analyzer::new(
        backend,
        Arc::new(LexiconClassifier::new()),
        options,
        AnalyzerLimits::default(),
    );

    let criteria = SearchCriteria::new("Lionel Messi")
        .affiliation("Inter Miami")
        .last_days(7, Utc::now().date_naive());
    let report = analyzer.run(&criteria).await?;

    println!("query:    {}", report.query);
    println!("status:   {:?}", report.status);
    let s = &report.summary;
    println!(
        "total {} | positive {} ({:.1}%) | negative {} ({:.1}%) | neutral {} ({:.1}%)",
        s.total,
        s.counts.positive,
        s.percentages.positive,
        s.counts.negative,
        s.percentages.negative,
        s.counts.neutral,
        s.percentages.neutral
    );
    match s.mean_score {
        Some(m) => println!("mean score {m:.2}"),
        None => println!("mean score n/a"),
    }
    for r in &report.results {
        println!("[{:>8}] {}", r.label.as_str(), r.normalized_text);
    }

    println!("pulse-demo done");
    Ok(())
}
