// src/dispatch.rs
//! Query dispatcher: resolves a report against the record store it owns.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, warn};

use crate::report::{self, ReportKind, ReportResult};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("aggregation failed: {0}")]
    Aggregation(#[from] StoreError),
}

impl ReportError {
    /// Stable error kind for callers.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::Aggregation(_) => "aggregation failed",
        }
    }

    /// Underlying storage message, surfaced verbatim.
    pub fn detail(&self) -> String {
        match self {
            ReportError::Aggregation(e) => e.to_string(),
        }
    }
}

/// Stateless per call; the store handle is the only thing shared.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn RecordStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn run(&self, kind: ReportKind) -> Result<ReportResult, ReportError> {
        let started = Instant::now();
        let slug = kind.slug();

        let points = match self.store.fetch_all().await {
            Ok(points) => points,
            Err(e) => {
                counter!("report_failures_total", "report" => slug).increment(1);
                warn!(
                    target: "report",
                    report = slug,
                    store = self.store.name(),
                    error = %e,
                    "aggregation failed"
                );
                return Err(e.into());
            }
        };

        let result = report::run(kind, &points);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        counter!("report_requests_total", "report" => slug).increment(1);
        histogram!("report_duration_ms", "report" => slug).record(elapsed_ms);
        debug!(
            target: "report",
            report = slug,
            records = points.len(),
            elapsed_ms,
            "report computed"
        );
        Ok(result)
    }
}
