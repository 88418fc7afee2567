// src/report.rs
//! # Aggregation definitions
//! One pure function per dashboard report, each shaping a slice of
//! [`DataPoint`]s into a chart-ready [`ReportResult`].
//!
//! Ordering is part of the contract: groups are built in first-seen order and
//! every sort is stable, so ties keep that order and reruns over the same
//! records produce identical output.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::model::{Category, DataPoint, Metric};

/// Bar chart shows the top countries only.
pub const LIKELIHOOD_TOP_N: usize = 15;
/// Radar chart shows the top topics only.
pub const TOPIC_TOP_N: usize = 10;
/// Placeholder for most-frequent lookups over an empty collection.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    IntensityByYear,
    LikelihoodByCountry,
    RegionDistribution,
    YearTrend,
    PestleDistribution,
    SectorDistribution,
    TopicDistribution,
    SwotAnalysis,
    KpiSummary,
}

impl ReportKind {
    pub const ALL: [ReportKind; 9] = [
        ReportKind::IntensityByYear,
        ReportKind::LikelihoodByCountry,
        ReportKind::RegionDistribution,
        ReportKind::YearTrend,
        ReportKind::PestleDistribution,
        ReportKind::SectorDistribution,
        ReportKind::TopicDistribution,
        ReportKind::SwotAnalysis,
        ReportKind::KpiSummary,
    ];

    /// Route segment under `/data/`.
    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::IntensityByYear => "intensity-year",
            ReportKind::LikelihoodByCountry => "likelihood-country",
            ReportKind::RegionDistribution => "region",
            ReportKind::YearTrend => "year-trend",
            ReportKind::PestleDistribution => "pestle",
            ReportKind::SectorDistribution => "sector",
            ReportKind::TopicDistribution => "topic",
            ReportKind::SwotAnalysis => "swot",
            ReportKind::KpiSummary => "kpi",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    /// Chart the dashboard renders this report with.
    pub fn chart(self) -> &'static str {
        match self {
            ReportKind::IntensityByYear => "line",
            ReportKind::LikelihoodByCountry => "bar",
            ReportKind::RegionDistribution | ReportKind::SectorDistribution => "donut",
            ReportKind::YearTrend => "area",
            ReportKind::PestleDistribution => "pie",
            ReportKind::TopicDistribution | ReportKind::SwotAnalysis => "radar",
            ReportKind::KpiSummary => "kpi",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// One `(key, value)` pair of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_records: u64,
    pub avg_intensity: f64,
    pub avg_likelihood: f64,
    pub avg_relevance: f64,
    pub top_sector: String,
    pub top_country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportResult {
    Series(Vec<SeriesPoint>),
    Summary(KpiSummary),
}

impl ReportResult {
    pub fn series(&self) -> Option<&[SeriesPoint]> {
        match self {
            ReportResult::Series(s) => Some(s),
            ReportResult::Summary(_) => None,
        }
    }
}

/// Evaluate `kind` over `points`.
pub fn run(kind: ReportKind, points: &[DataPoint]) -> ReportResult {
    match kind {
        ReportKind::IntensityByYear => ReportResult::Series(intensity_by_year(points)),
        ReportKind::LikelihoodByCountry => ReportResult::Series(likelihood_by_country(points)),
        ReportKind::RegionDistribution => ReportResult::Series(region_distribution(points)),
        ReportKind::YearTrend => ReportResult::Series(year_trend(points)),
        ReportKind::PestleDistribution => ReportResult::Series(pestle_distribution(points)),
        ReportKind::SectorDistribution => ReportResult::Series(sector_distribution(points)),
        ReportKind::TopicDistribution => ReportResult::Series(topic_distribution(points)),
        ReportKind::SwotAnalysis => ReportResult::Series(swot_analysis(points)),
        ReportKind::KpiSummary => ReportResult::Summary(kpi_summary(points)),
    }
}

/// Line chart: average intensity per in-range year, years ascending.
pub fn intensity_by_year(points: &[DataPoint]) -> Vec<SeriesPoint> {
    let mut rows = group(points, DataPoint::year_in_range, Reduce::Average(Metric::Intensity));
    rows.sort_by_key(|(year, _)| *year);
    into_series(rows)
}

/// Bar chart: average likelihood per country, top 15.
pub fn likelihood_by_country(points: &[DataPoint]) -> Vec<SeriesPoint> {
    let rows = group(
        points,
        by(Category::Country),
        Reduce::Average(Metric::Likelihood),
    );
    into_series(ranked(rows, Some(LIKELIHOOD_TOP_N)))
}

/// Donut chart: record count per region, largest first.
pub fn region_distribution(points: &[DataPoint]) -> Vec<SeriesPoint> {
    let rows = group(points, by(Category::Region), Reduce::Count);
    into_series(ranked(rows, None))
}

/// Area chart: record count per in-range year, years ascending.
pub fn year_trend(points: &[DataPoint]) -> Vec<SeriesPoint> {
    let mut rows = group(points, DataPoint::year_in_range, Reduce::Count);
    rows.sort_by_key(|(year, _)| *year);
    into_series(rows)
}

/// Pie chart: record count per pestle. Unsorted, first-seen order.
pub fn pestle_distribution(points: &[DataPoint]) -> Vec<SeriesPoint> {
    into_series(group(points, by(Category::Pestle), Reduce::Count))
}

/// Donut chart: summed intensity per sector, largest first.
pub fn sector_distribution(points: &[DataPoint]) -> Vec<SeriesPoint> {
    let rows = group(points, by(Category::Sector), Reduce::Sum(Metric::Intensity));
    into_series(ranked(rows, None))
}

/// Radar chart: summed relevance per topic, top 10.
pub fn topic_distribution(points: &[DataPoint]) -> Vec<SeriesPoint> {
    let rows = group(points, by(Category::Topic), Reduce::Sum(Metric::Relevance));
    into_series(ranked(rows, Some(TOPIC_TOP_N)))
}

/// Radar chart: average relevance per swot value. Unsorted, first-seen order.
pub fn swot_analysis(points: &[DataPoint]) -> Vec<SeriesPoint> {
    into_series(group(
        points,
        by(Category::Swot),
        Reduce::Average(Metric::Relevance),
    ))
}

pub fn kpi_summary(points: &[DataPoint]) -> KpiSummary {
    KpiSummary {
        total_records: points.len() as u64,
        avg_intensity: mean(points, Metric::Intensity),
        avg_likelihood: mean(points, Metric::Likelihood),
        avg_relevance: mean(points, Metric::Relevance),
        top_sector: most_frequent(points, Category::Sector)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        top_country: most_frequent(points, Category::Country)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

/// Average of the present values of `metric`; 0 when none are present.
pub fn mean(points: &[DataPoint], metric: Metric) -> f64 {
    let mut acc = Acc::default();
    for p in points {
        acc.push(p.metric(metric));
    }
    acc.average()
}

/// Most common non-empty value of `category`; the first-seen key wins ties.
pub fn most_frequent(points: &[DataPoint], category: Category) -> Option<String> {
    let rows = group(points, by(category), Reduce::Count);
    let mut best: Option<(String, f64)> = None;
    for (key, count) in rows {
        match &best {
            Some((_, top)) if count <= *top => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(key, _)| key)
}

#[derive(Debug, Clone, Copy)]
enum Reduce {
    Count,
    Sum(Metric),
    Average(Metric),
}

impl Reduce {
    fn metric(self) -> Option<Metric> {
        match self {
            Reduce::Count => None,
            Reduce::Sum(m) | Reduce::Average(m) => Some(m),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Acc {
    records: u64,
    present: u64,
    sum: f64,
}

impl Acc {
    fn push(&mut self, value: Option<f64>) {
        self.records += 1;
        if let Some(v) = value {
            self.present += 1;
            self.sum += v;
        }
    }

    fn average(&self) -> f64 {
        if self.present == 0 {
            0.0
        } else {
            self.sum / self.present as f64
        }
    }

    fn reduce(&self, r: Reduce) -> f64 {
        match r {
            Reduce::Count => self.records as f64,
            Reduce::Sum(_) => self.sum,
            Reduce::Average(_) => self.average(),
        }
    }
}

/// Key selector for a categorical field; empty values are excluded.
fn by(category: Category) -> impl Fn(&DataPoint) -> Option<String> {
    move |p: &DataPoint| {
        let v = p.category(category);
        (!v.is_empty()).then(|| v.to_string())
    }
}

/// Group `points` by `key` (skipping `None`) and reduce each group,
/// keeping groups in first-seen order.
fn group<K, F>(points: &[DataPoint], key: F, reduce: Reduce) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    F: Fn(&DataPoint) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Acc)> = Vec::new();
    let metric = reduce.metric();

    for p in points {
        let Some(k) = key(p) else { continue };
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Acc::default()));
            groups.len() - 1
        });
        groups[slot].1.push(metric.and_then(|m| p.metric(m)));
    }

    groups
        .into_iter()
        .map(|(k, acc)| (k, acc.reduce(reduce)))
        .collect()
}

/// Value-descending (stable) with an optional limit.
fn ranked<K>(mut rows: Vec<(K, f64)>, limit: Option<usize>) -> Vec<(K, f64)> {
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    if let Some(n) = limit {
        rows.truncate(n);
    }
    rows
}

fn into_series<K: ToString>(rows: Vec<(K, f64)>) -> Vec<SeriesPoint> {
    rows.into_iter()
        .map(|(k, value)| SeriesPoint {
            key: k.to_string(),
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(f: impl FnOnce(&mut DataPoint)) -> DataPoint {
        let mut p = DataPoint::default();
        f(&mut p);
        p
    }

    #[test]
    fn slugs_round_trip_and_are_unique() {
        for k in ReportKind::ALL {
            assert_eq!(ReportKind::from_slug(k.slug()), Some(k));
        }
        assert_eq!(ReportKind::from_slug("nope"), None);
    }

    #[test]
    fn group_keeps_first_seen_order() {
        let pts = vec![
            pt(|p| p.pestle = "Economic".into()),
            pt(|p| p.pestle = "Political".into()),
            pt(|p| p.pestle = "Economic".into()),
            pt(|p| p.pestle = "".into()),
        ];
        let out = pestle_distribution(&pts);
        assert_eq!(
            out,
            vec![
                SeriesPoint {
                    key: "Economic".into(),
                    value: 2.0
                },
                SeriesPoint {
                    key: "Political".into(),
                    value: 1.0
                },
            ]
        );
    }

    #[test]
    fn ranked_ties_stay_in_first_seen_order() {
        let pts = vec![
            pt(|p| p.region = "Asia".into()),
            pt(|p| p.region = "Europe".into()),
            pt(|p| p.region = "Africa".into()),
            pt(|p| p.region = "Africa".into()),
        ];
        let keys: Vec<_> = region_distribution(&pts)
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["Africa", "Asia", "Europe"]);
    }

    #[test]
    fn averages_skip_absent_values() {
        let pts = vec![
            pt(|p| {
                p.swot = "Strength".into();
                p.relevance = Some(4.0);
            }),
            pt(|p| p.swot = "Strength".into()),
            pt(|p| p.swot = "Threat".into()),
        ];
        let out = swot_analysis(&pts);
        assert_eq!(out[0].value, 4.0);
        assert_eq!(out[1].key, "Threat");
        assert_eq!(out[1].value, 0.0);
    }

    #[test]
    fn most_frequent_ignores_empty_and_prefers_first_seen() {
        let pts = vec![
            pt(|p| p.sector = "".into()),
            pt(|p| p.sector = "".into()),
            pt(|p| p.sector = "".into()),
            pt(|p| p.sector = "Energy".into()),
            pt(|p| p.sector = "Retail".into()),
        ];
        assert_eq!(
            most_frequent(&pts, Category::Sector).as_deref(),
            Some("Energy")
        );
        assert_eq!(most_frequent(&pts, Category::Country), None);
    }
}
