// tests/api_http.rs
//
// HTTP surface exercised in-process through `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use shuttle_axum::axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use player_sentiment_analyzer::api::{create_router, AppState};
use player_sentiment_analyzer::query::QueryOptions;
use player_sentiment_analyzer::api::{RUN_ADVISORY_HEADER, RUN_STATUS_HEADER};
use player_sentiment_analyzer::query::QueryExpression;
use player_sentiment_analyzer::retrieval::{
    Engagement, MemoryBackend, RawPost, RetrievalBackend, RetrievalError,
};
use player_sentiment_analyzer::sentiment::{
    Classification, ClassifierError, LexiconClassifier, SentimentClassifier,
};
use player_sentiment_analyzer::{Analyzer, AnalyzerLimits};

fn posts() -> Vec<RawPost> {
    let mk = |id: &str, text: &str, likes: u64| RawPost {
        id: id.into(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 9, 18, 30, 0).unwrap(),
        author_handle: "hincha".into(),
        body_text: text.into(),
        url: format!("https://twitter.com/hincha/status/{id}"),
        engagement: Engagement {
            likes,
            ..Engagement::default()
        },
    };
    vec![
        mk("10", "Qué golazo, un crack", 5),
        mk("11", "Partido pésimo, \"un desastre\"", 2),
    ]
}

struct DownClassifier;

#[async_trait]
impl SentimentClassifier for DownClassifier {
    async fn classify(&self, _texts: &[String]) -> Result<Vec<Classification>, ClassifierError> {
        Err(ClassifierError::Status(500))
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

struct UnreachableBackend;

#[async_trait]
impl RetrievalBackend for UnreachableBackend {
    async fn search(&self, _q: &QueryExpression, _limit: usize) -> Result<Vec<RawPost>, RetrievalError> {
        Err(RetrievalError::Status {
            origin: "https://nitter.example".into(),
            status: 429,
        })
    }
    fn name(&self) -> &'static str {
        "unreachable"
    }
}

fn app_with(classifier: Arc<dyn SentimentClassifier>) -> Router {
    app_from(Arc::new(MemoryBackend::new(posts())), classifier)
}

fn app_from(backend: Arc<dyn RetrievalBackend>, classifier: Arc<dyn SentimentClassifier>) -> Router {
    let options = QueryOptions {
        language: Some("es".into()),
        exclude_reposts: true,
        ..QueryOptions::default()
    };
    let analyzer = Analyzer::new(
        backend,
        classifier,
        options,
        AnalyzerLimits::default(),
    );
    create_router(AppState::new(analyzer))
}

fn app() -> Router {
    app_with(Arc::new(LexiconClassifier::new()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: shuttle_axum::axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let resp = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn analyze_returns_report() {
    let resp = app()
        .oneshot(post_json(
            "/analyze",
            json!({"subject_name": "Lionel Messi", "affiliation": "Inter Miami"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    assert_eq!(v["status"], "ok");
    assert_eq!(
        v["query"],
        r#"("Lionel Messi" OR (Lionel AND "Inter Miami") OR (Messi AND "Inter Miami")) lang:es -filter:retweets"#
    );
    assert_eq!(v["summary"]["total"], 2);
    assert_eq!(v["summary"]["counts"]["positive"], 1);
    assert_eq!(v["summary"]["counts"]["negative"], 1);
    assert_eq!(v["summary"]["percentages"]["positive"], 50.0);
    assert_eq!(v["results"][0]["label"], "positive");
    assert_eq!(v["results"][1]["label"], "negative");
}

#[tokio::test]
async fn analyze_rejects_blank_subject() {
    let resp = app()
        .oneshot(post_json("/analyze", json!({"subject_name": "   "})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = body_json(resp).await;
    assert_eq!(v["kind"], "invalid_criteria");
}

#[tokio::test]
async fn analyze_rejects_inverted_dates() {
    let resp = app()
        .oneshot(post_json(
            "/analyze",
            json!({"subject_name": "Messi", "date_from": "2024-02-01", "date_to": "2024-01-01"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn classifier_outage_maps_to_bad_gateway() {
    let resp = app_with(Arc::new(DownClassifier))
        .oneshot(post_json("/analyze", json!({"subject_name": "Messi"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v = body_json(resp).await;
    assert_eq!(v["kind"], "classification_failure");
}

#[tokio::test]
async fn csv_export_has_download_headers() {
    let resp = app()
        .oneshot(post_json("/analyze.csv", json!({"subject_name": "Lionel Messi"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let ctype = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(ctype.starts_with("text/csv"));
    let disp = resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disp.contains("sentiment_lionel_messi_"), "{disp}");

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = text.split("\r\n");
    assert!(lines.next().unwrap().starts_with("id,timestamp,author_handle"));
    assert!(text.contains(r#""Partido pésimo, ""un desastre""""#));
}

#[tokio::test]
async fn csv_export_carries_run_status() {
    let resp = app()
        .oneshot(post_json("/analyze.csv", json!({"subject_name": "Messi"})))
        .await
        .unwrap();
    assert_eq!(resp.headers()[&RUN_STATUS_HEADER], "ok");
    assert!(resp.headers().get(&RUN_ADVISORY_HEADER).is_none());

    let resp = app_from(Arc::new(UnreachableBackend), Arc::new(LexiconClassifier::new()))
        .oneshot(post_json("/analyze.csv", json!({"subject_name": "Messi"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[&RUN_STATUS_HEADER], "retrieval_failed");
    let advisory = resp.headers()[&RUN_ADVISORY_HEADER].to_str().unwrap().to_string();
    assert!(advisory.contains("429"), "{advisory}");

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 1, "header row only");
}

#[tokio::test]
async fn undecodable_body_is_invalid_criteria() {
    for body in [json!({"affiliation": "Inter Miami"}), json!({"subject_name": 7})] {
        let resp = app().oneshot(post_json("/analyze", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["kind"], "invalid_criteria");
        assert!(v["message"].as_str().unwrap().starts_with("invalid criteria"));
    }

    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn query_dry_run() {
    let resp = app()
        .oneshot(post_json(
            "/query",
            json!({"subject_name": "Lionel Messi", "date_to": "2024-01-10"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(
        v["query"],
        r#""Lionel Messi" until:2024-01-11 lang:es -filter:retweets"#
    );
}

#[tokio::test]
async fn timeline_route() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/timeline/hincha?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["query"], "from:hincha -filter:retweets");
    assert_eq!(v["summary"]["total"], 1);

    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/timeline/hincha?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
