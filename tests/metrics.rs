// tests/metrics.rs
use std::fs;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use insight_reports::{app_with_config, DashboardConfig};

#[tokio::test]
async fn metrics_endpoint_contains_report_series() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.json");
    fs::write(&data, r#"[{"region":"Europe"},{"likelihood":"?"}]"#).unwrap();

    let cfg = DashboardConfig {
        data_path: data,
        debug_routes: true,
    };
    let app = app_with_config(&cfg).expect("app should build");

    let r = app
        .clone()
        .oneshot(Request::get("/data/region").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::OK);

    let m = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(m.status(), StatusCode::OK);
    let body = body::to_bytes(m.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "report_requests_total",
        "report_duration_ms",
        "report_rejected_documents_total",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}

#[tokio::test]
async fn metrics_route_absent_without_debug_routes() {
    let cfg = DashboardConfig {
        data_path: "unused.json".into(),
        debug_routes: false,
    };
    let app = app_with_config(&cfg).expect("app should build");
    let r = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_data_file_surfaces_as_500() {
    let cfg = DashboardConfig {
        data_path: "definitely/not/here.json".into(),
        debug_routes: false,
    };
    let app = app_with_config(&cfg).expect("app should build");
    let r = app
        .oneshot(Request::get("/data/kpi").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body::to_bytes(r.into_body(), 1_048_576).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(v["error"].as_str().unwrap().contains("here.json"));
}
