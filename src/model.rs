// src/model.rs
//! Typed data points and the parse-and-validate step applied to raw documents
//! before anything reaches the aggregation layer.

use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Inclusive bounds for `end_year` when used as a temporal axis.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// One validated observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataPoint {
    /// Parsed `end_year`; `None` when empty or non-numeric.
    pub end_year: Option<i32>,
    pub intensity: Option<f64>,
    pub likelihood: Option<f64>,
    pub relevance: Option<f64>,
    pub country: String,
    pub region: String,
    pub sector: String,
    pub topic: String,
    pub pestle: String,
    pub swot: String,
}

impl DataPoint {
    /// `end_year` if it is usable as a temporal axis.
    pub fn year_in_range(&self) -> Option<i32> {
        self.end_year.filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
    }

    pub fn category(&self, c: Category) -> &str {
        match c {
            Category::Country => &self.country,
            Category::Region => &self.region,
            Category::Sector => &self.sector,
            Category::Topic => &self.topic,
            Category::Pestle => &self.pestle,
            Category::Swot => &self.swot,
        }
    }

    pub fn metric(&self, m: Metric) -> Option<f64> {
        match m {
            Metric::Intensity => self.intensity,
            Metric::Likelihood => self.likelihood,
            Metric::Relevance => self.relevance,
        }
    }
}

/// Categorical grouping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Country,
    Region,
    Sector,
    Topic,
    Pestle,
    Swot,
}

/// Numeric fields that can be averaged or summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Intensity,
    Likelihood,
    Relevance,
}

/// A document as it sits in the store. Every field is optional and loosely
/// typed; unknown fields (`_id`, `title`, `url`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub end_year: Value,
    #[serde(default)]
    pub intensity: Value,
    #[serde(default)]
    pub likelihood: Value,
    #[serde(default)]
    pub relevance: Value,
    #[serde(default)]
    pub country: Value,
    #[serde(default)]
    pub region: Value,
    #[serde(default)]
    pub sector: Value,
    #[serde(default)]
    pub topic: Value,
    #[serde(default)]
    pub pestle: Value,
    #[serde(default)]
    pub swot: Value,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("document is not an object: {0}")]
    NotAnObject(String),
    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },
    #[error("field `{field}` is not text: {value}")]
    NotText { field: &'static str, value: String },
}

impl TryFrom<RawDocument> for DataPoint {
    type Error = RecordError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        Ok(DataPoint {
            end_year: parse_year(&raw.end_year),
            intensity: parse_number("intensity", &raw.intensity)?,
            likelihood: parse_number("likelihood", &raw.likelihood)?,
            relevance: parse_number("relevance", &raw.relevance)?,
            country: parse_text("country", &raw.country)?,
            region: parse_text("region", &raw.region)?,
            sector: parse_text("sector", &raw.sector)?,
            topic: parse_text("topic", &raw.topic)?,
            pestle: parse_text("pestle", &raw.pestle)?,
            swot: parse_text("swot", &raw.swot)?,
        })
    }
}

impl TryFrom<Value> for DataPoint {
    type Error = RecordError;

    fn try_from(doc: Value) -> Result<Self, Self::Error> {
        if !doc.is_object() {
            return Err(RecordError::NotAnObject(short(&doc)));
        }
        let raw: RawDocument =
            serde_json::from_value(doc).map_err(|e| RecordError::NotAnObject(e.to_string()))?;
        DataPoint::try_from(raw)
    }
}

/// Outcome of validating a batch of documents.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub points: Vec<DataPoint>,
    pub rejected: usize,
}

/// Validate raw documents; invalid ones are dropped and counted.
pub fn parse_documents(docs: Vec<Value>) -> ParsedBatch {
    let mut batch = ParsedBatch {
        points: Vec::with_capacity(docs.len()),
        rejected: 0,
    };
    for (idx, doc) in docs.into_iter().enumerate() {
        match DataPoint::try_from(doc) {
            Ok(p) => batch.points.push(p),
            Err(e) => {
                debug!(target: "store", idx, error = %e, "document rejected");
                batch.rejected += 1;
            }
        }
    }
    if batch.rejected > 0 {
        counter!("report_rejected_documents_total").increment(batch.rejected as u64);
        warn!(
            target: "store",
            kept = batch.points.len(),
            rejected = batch.rejected,
            "invalid documents excluded"
        );
    }
    batch
}

/// Year parsing never fails: anything unusable becomes `None`.
fn parse_year(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(y) => i32::try_from(y).ok(),
            // relaxed exports write years as doubles, e.g. 2016.0
            None => n
                .as_f64()
                .filter(|y| y.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(y))
                .map(|y| y as i32),
        },
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

fn parse_number(field: &'static str, v: &Value) -> Result<Option<f64>, RecordError> {
    let not_numeric = || RecordError::NotNumeric {
        field,
        value: short(v),
    };
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .filter(|x| x.is_finite())
            .map(Some)
            .ok_or_else(not_numeric),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Some)
            .ok_or_else(not_numeric),
        _ => Err(not_numeric()),
    }
}

fn parse_text(field: &'static str, v: &Value) -> Result<String, RecordError> {
    match v {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.trim().to_string()),
        _ => Err(RecordError::NotText {
            field,
            value: short(v),
        }),
    }
}

fn short(v: &Value) -> String {
    let s = v.to_string();
    if s.chars().count() > 60 {
        let mut out: String = s.chars().take(60).collect();
        out.push('…');
        out
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_fields_become_absent_or_empty() {
        let p = DataPoint::try_from(json!({
            "end_year": "",
            "intensity": "",
            "likelihood": null,
            "country": "",
            "region": "  Northern America ",
            "title": "ignored"
        }))
        .unwrap();
        assert_eq!(p.end_year, None);
        assert_eq!(p.intensity, None);
        assert_eq!(p.likelihood, None);
        assert_eq!(p.relevance, None);
        assert_eq!(p.country, "");
        assert_eq!(p.region, "Northern America");
        assert_eq!(p.swot, "");
    }

    #[test]
    fn numeric_strings_and_numbers_are_accepted() {
        let p = DataPoint::try_from(json!({
            "end_year": 2018,
            "intensity": "6",
            "likelihood": 3,
            "relevance": 2.5
        }))
        .unwrap();
        assert_eq!(p.end_year, Some(2018));
        assert_eq!(p.intensity, Some(6.0));
        assert_eq!(p.likelihood, Some(3.0));
        assert_eq!(p.relevance, Some(2.5));
    }

    #[test]
    fn bad_year_is_dropped_not_rejected() {
        let p = DataPoint::try_from(json!({ "end_year": "soon" })).unwrap();
        assert_eq!(p.end_year, None);
        let p = DataPoint::try_from(json!({ "end_year": "1800" })).unwrap();
        assert_eq!(p.end_year, Some(1800));
        assert_eq!(p.year_in_range(), None);
    }

    #[test]
    fn integral_float_year_is_accepted() {
        let p = DataPoint::try_from(json!({ "end_year": 2016.0 })).unwrap();
        assert_eq!(p.end_year, Some(2016));
        let p = DataPoint::try_from(json!({ "end_year": 2016.5 })).unwrap();
        assert_eq!(p.end_year, None);

        let batch = parse_documents(vec![
            json!({ "end_year": 2016.0, "intensity": 2 }),
            json!({ "end_year": "2016", "intensity": 4 }),
            json!({ "end_year": 2016, "intensity": 6 }),
        ]);
        let out = crate::report::intensity_by_year(&batch.points);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "2016");
        assert_eq!(out[0].value, 4.0);
    }

    #[test]
    fn garbage_numbers_and_non_text_categories_reject_the_document() {
        let err = DataPoint::try_from(json!({ "intensity": "high" })).unwrap_err();
        assert!(matches!(err, RecordError::NotNumeric { field: "intensity", .. }));

        let err = DataPoint::try_from(json!({ "sector": 12 })).unwrap_err();
        assert!(matches!(err, RecordError::NotText { field: "sector", .. }));

        let err = DataPoint::try_from(json!([1, 2])).unwrap_err();
        assert!(matches!(err, RecordError::NotAnObject(_)));
    }

    #[test]
    fn batch_counts_rejections() {
        let batch = parse_documents(vec![
            json!({ "sector": "Energy" }),
            json!({ "relevance": true }),
            json!("nope"),
        ]);
        assert_eq!(batch.points.len(), 1);
        assert_eq!(batch.rejected, 2);
        assert_eq!(batch.points[0].category(Category::Sector), "Energy");
    }
}
