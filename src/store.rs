// src/store.rs
//! Record Store seam. The aggregation layer only ever reads typed
//! [`DataPoint`]s through [`RecordStore`]; each implementation owns its own
//! parse-and-validate step at the boundary.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use metrics::counter;
use tracing::{debug, warn};

use crate::model::{parse_documents, DataPoint};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed data in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Every valid record currently in the store.
    async fn fetch_all(&self) -> Result<Vec<DataPoint>, StoreError>;
    fn name(&self) -> &'static str;
}

/// Documents exported from the document store as a file, re-read on every
/// call. Accepts a JSON array or JSON Lines (one document per line, the
/// `mongoexport` default).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl RecordStore for JsonFileStore {
    async fn fetch_all(&self) -> Result<Vec<DataPoint>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        let payload = parse_payload(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        if payload.bad_lines > 0 {
            counter!("report_rejected_documents_total").increment(payload.bad_lines as u64);
            warn!(
                target: "store",
                path = %self.path.display(),
                rejected = payload.bad_lines,
                "malformed lines excluded"
            );
        }
        let batch = parse_documents(payload.docs);
        debug!(
            target: "store",
            path = %self.path.display(),
            kept = batch.points.len(),
            rejected = batch.rejected,
            "file store loaded"
        );
        Ok(batch.points)
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

/// Raw documents split out of a file.
#[derive(Debug, Default)]
pub struct Payload {
    pub docs: Vec<Value>,
    /// JSON Lines entries that did not parse.
    pub bad_lines: usize,
}

/// Split file content into raw documents. A malformed array fails the whole
/// file; in JSON Lines each bad line only loses its own record.
pub fn parse_payload(content: &str) -> Result<Payload, serde_json::Error> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(Payload::default());
    }
    if trimmed.starts_with('[') {
        let docs = serde_json::from_str(trimmed)?;
        return Ok(Payload { docs, bad_lines: 0 });
    }
    let mut payload = Payload::default();
    for (idx, line) in trimmed.lines().map(str::trim).enumerate() {
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(doc) => payload.docs.push(doc),
            Err(e) => {
                debug!(target: "store", line = idx + 1, error = %e, "line rejected");
                payload.bad_lines += 1;
            }
        }
    }
    Ok(payload)
}

/// Fixed, already-validated records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    points: Vec<DataPoint>,
}

impl MemoryStore {
    pub fn new(points: Vec<DataPoint>) -> Self {
        Self { points }
    }

    /// Validate raw documents the same way the file store does.
    pub fn from_documents(docs: Vec<Value>) -> Self {
        Self::new(parse_documents(docs).points)
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<DataPoint>, StoreError> {
        Ok(self.points.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_accepts_array_and_json_lines() {
        let arr = r#"[{"sector":"Energy"},{"sector":"Retail"}]"#;
        assert_eq!(parse_payload(arr).unwrap().docs.len(), 2);

        let lines = "{\"sector\":\"Energy\"}\n\n{\"sector\":\"Retail\"}\n";
        assert_eq!(parse_payload(lines).unwrap().docs.len(), 2);

        assert!(parse_payload("   ").unwrap().docs.is_empty());
        assert!(parse_payload("[{\"sector\":").is_err());

        let out = parse_payload("{\"sector\":\"Energy\"}\n{\"sector\":").unwrap();
        assert_eq!(out.docs.len(), 1);
        assert_eq!(out.bad_lines, 1);
    }

    #[tokio::test]
    async fn memory_store_validates_documents() {
        let store = MemoryStore::from_documents(vec![
            serde_json::json!({ "country": "India" }),
            serde_json::json!({ "likelihood": "very" }),
        ]);
        let pts = store.fetch_all().await.unwrap();
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].country, "India");
    }
}
