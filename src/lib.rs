// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod model;
pub mod report;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::DashboardConfig;
pub use crate::dispatch::{ReportError, ReportService};
pub use crate::model::DataPoint;
pub use crate::report::{ReportKind, ReportResult};
pub use crate::store::{JsonFileStore, MemoryStore, RecordStore, StoreError};

use std::sync::Arc;

use axum::Router;
use tracing::info;

/// Build the full app from config files and environment.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = DashboardConfig::load()?;
    app_with_config(&cfg)
}

/// Build the full app for an explicit config: file-backed store, report
/// routes, and `/metrics` when debug routes are on.
pub fn app_with_config(cfg: &DashboardConfig) -> anyhow::Result<Router> {
    let store = JsonFileStore::new(&cfg.data_path);
    info!(
        data_path = %cfg.data_path.display(),
        debug_routes = cfg.debug_routes,
        "report service configured"
    );

    let state = AppState::new(ReportService::new(Arc::new(store)));
    let mut app = api::router(state);
    if cfg.debug_routes {
        let m = crate::metrics::Metrics::init()?;
        app = app.merge(m.router());
    }
    Ok(app)
}
