use std::collections::HashMap;
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analysis::{AnalysisReport, Analyzer, RunStatus};
use crate::error::{AnalysisError, ErrorKind};
use crate::export::{csv_filename, results_to_csv};
use crate::query::{CriteriaError, SearchCriteria, DEFAULT_RESULT_LIMIT};

pub const RUN_STATUS_HEADER: HeaderName = HeaderName::from_static("x-run-status");
pub const RUN_ADVISORY_HEADER: HeaderName = HeaderName::from_static("x-run-advisory");

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
        .route("/analyze.csv", post(analyze_csv))
        .route("/query", post(dry_run_query))
        .route("/timeline/{handle}", get(timeline))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Error body: `{"kind": "...", "message": "..."}`.
pub struct ApiError(AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e)
    }
}

/// Bodies that do not decode into `SearchCriteria` are invalid criteria too.
impl From<JsonRejection> for ApiError {
    fn from(rej: JsonRejection) -> Self {
        Self(CriteriaError::MalformedBody(rej.body_text()).into())
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::InvalidCriteria => StatusCode::BAD_REQUEST,
            ErrorKind::RetrievalFailure | ErrorKind::ClassificationFailure => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            kind,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<SearchCriteria>, JsonRejection>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let Json(criteria) = body?;
    let report = state.analyzer.run(&criteria).await?;
    Ok(Json(report))
}

async fn analyze_csv(
    State(state): State<AppState>,
    body: Result<Json<SearchCriteria>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(criteria) = body?;
    let report = state.analyzer.run(&criteria).await?;
    let filename = csv_filename(&criteria.subject_name, chrono::Utc::now().date_naive());
    let csv = results_to_csv(&report.results);
    let mut resp = (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response();
    insert_status_headers(resp.headers_mut(), &report.status);
    Ok(resp)
}

/// CSV has no room for the run status, so it travels in headers.
fn insert_status_headers(headers: &mut HeaderMap, status: &RunStatus) {
    headers.insert(RUN_STATUS_HEADER, HeaderValue::from_static(status.as_str()));
    if let Some(advisory) = status.advisory() {
        // Header values must be visible ASCII.
        let ascii: String = advisory
            .chars()
            .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
            .collect();
        if let Ok(v) = HeaderValue::from_str(&ascii) {
            headers.insert(RUN_ADVISORY_HEADER, v);
        }
    }
}

#[derive(serde::Serialize)]
struct QueryResp {
    query: String,
}

async fn dry_run_query(
    State(state): State<AppState>,
    body: Result<Json<SearchCriteria>, JsonRejection>,
) -> Result<Json<QueryResp>, ApiError> {
    let Json(criteria) = body?;
    let q = state.analyzer.query_for(&criteria)?;
    Ok(Json(QueryResp {
        query: q.into_string(),
    }))
}

async fn timeline(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let limit = q
        .get("limit")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_RESULT_LIMIT);
    let report = state.analyzer.timeline(&handle, limit).await?;
    Ok(Json(report))
}
