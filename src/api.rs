use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::dispatch::{ReportError, ReportService};
use crate::report::ReportKind;

#[derive(Clone)]
pub struct AppState {
    reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(reports: ReportService) -> Self {
        Self {
            reports: Arc::new(reports),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/data", get(report_index))
        .route("/data/{report}", get(serve_report))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.detail(), "kind": self.kind() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[derive(serde::Serialize)]
struct IndexEntry {
    report: &'static str,
    path: String,
    chart: &'static str,
}

async fn report_index() -> Json<Vec<IndexEntry>> {
    let out = ReportKind::ALL
        .into_iter()
        .map(|k| IndexEntry {
            report: k.slug(),
            path: format!("/data/{}", k.slug()),
            chart: k.chart(),
        })
        .collect::<Vec<_>>();
    Json(out)
}

async fn serve_report(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(kind) = ReportKind::from_slug(&slug) else {
        warn!(target: "api", %slug, "unknown report requested");
        let body = json!({ "error": format!("unknown report '{slug}'") });
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };

    match state.reports.run(kind).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.into_response(),
    }
}
