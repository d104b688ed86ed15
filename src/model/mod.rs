//! Report model: run every aggregator over a parsed file and shape the
//! results into chart series.

use crate::aggregate::{self, HalfTimeout};
use crate::config::{Config, NoDataMarker};
use crate::data::parse::ParsedResults;
use crate::data::{Dataset, Outcome, SkippedRow};
use crate::diagnostics;
use crate::group::{GroupIndex, OrderKey, PairKey};
use crate::series::{self, ChartValue, CoordinateError, CoordinateTables, LineSeries, Triple};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub source: String,
    pub expected_runs: u32,
    pub totals: TotalsView,
    pub skipped: Vec<SkippedRow>,
    /// Human-readable problems that did not stop the report.
    pub warnings: Vec<String>,

    /// 1D charts, categories are node orders ascending.
    pub average: LineSeries,
    pub median: LineSeries,
    pub timeout_rate: LineSeries,
    pub timeout_count: LineSeries,

    /// Present when the input had an `edge probability` column.
    pub grid: Option<GridView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalsView {
    pub rows: usize,
    pub skipped: usize,
    pub successes: usize,
    pub timeouts: usize,
    pub out_of_memory: usize,
    pub found: usize,
    pub orders: usize,
    pub probabilities: usize,
}

/// 2D results over (order, probability).
#[derive(Debug, Clone, Serialize)]
pub struct GridView {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    /// Set when the heatmaps could not be placed; the other fields stay valid.
    pub error: Option<String>,
    pub average: Vec<Triple>,
    pub median: Vec<Triple>,
    pub timeout_rate: Vec<Triple>,
    pub half_timeout: HalfTimeoutView,
}

/// Bar chart of the smallest order reaching 50% timeouts, per probability.
#[derive(Debug, Clone, Serialize)]
pub struct HalfTimeoutView {
    pub labels: Vec<String>,
    pub values: Vec<ChartValue>,
}

/// Build report data. Performs:
/// - 1D aggregation keyed by order (sorted ascending for the axis)
/// - 2D aggregation keyed by (order, probability), in first-seen order
/// - warn about groups whose run count differs from `expected_runs`
/// - degrade to 1D-only output when a 2D key has no coordinate
pub fn build_report_data(source: &str, parsed: &ParsedResults, config: &Config) -> ReportData {
    let dataset = &parsed.dataset;
    let marker = &config.no_data;
    let step = config.timeout_step();
    let mut warnings = Vec::new();

    // Phase 1: order-keyed series.
    let orders = GroupIndex::<OrderKey>::build(dataset).sorted();
    let average = series::line_series(&aggregate::average(dataset, &orders), &orders, marker);
    let median = series::line_series(&aggregate::median_by_group(dataset, &orders), &orders, marker);
    let timeout_rate = series::line_series(
        &aggregate::timeout_rate(dataset, &orders, step),
        &orders,
        marker,
    );
    let timeout_count =
        series::line_series(&aggregate::timeout_count(dataset, &orders), &orders, marker);

    // Phase 2: (order, probability) grid.
    let pairs = GroupIndex::<PairKey>::build(dataset);
    let grid = if pairs.is_empty() {
        if !orders.is_empty() {
            let counts = orders.counts(dataset);
            warnings.extend(run_count_warnings(orders.keys(), &counts, config.expected_runs));
        }
        None
    } else {
        let counts = pairs.counts(dataset);
        warnings.extend(run_count_warnings(pairs.keys(), &counts, config.expected_runs));

        let tables = CoordinateTables::from_index(&orders);
        let grid = build_grid(dataset, &pairs, &tables, step, marker);
        if let Some(err) = &grid.error {
            warnings.push(err.clone());
        }
        Some(grid)
    };

    for w in &warnings {
        diagnostics::warn(format!("{}: {}", source, w));
    }

    ReportData {
        source: source.to_string(),
        expected_runs: config.expected_runs,
        totals: totals(parsed, orders.len(), &pairs),
        skipped: parsed.skipped.clone(),
        warnings,
        average,
        median,
        timeout_rate,
        timeout_count,
        grid,
    }
}

fn build_grid(
    dataset: &Dataset,
    pairs: &GroupIndex<PairKey>,
    tables: &CoordinateTables,
    step: f64,
    marker: &NoDataMarker,
) -> GridView {
    let avg = aggregate::average(dataset, pairs);
    let med = aggregate::median_by_group(dataset, pairs);
    let rates = aggregate::timeout_rate(dataset, pairs, step);
    let thresholds = aggregate::min_nodes_to_half_timeout(&rates, pairs);

    let heatmaps = || -> Result<[Vec<Triple>; 3], CoordinateError> {
        Ok([
            series::heatmap_triples(&avg, pairs, tables, marker)?,
            series::heatmap_triples(&med, pairs, tables, marker)?,
            series::heatmap_triples(&rates, pairs, tables, marker)?,
        ])
    };
    let (average, median, timeout_rate, error) = match heatmaps() {
        Ok([a, m, t]) => (a, m, t, None),
        Err(err) => (Vec::new(), Vec::new(), Vec::new(), Some(err.to_string())),
    };

    GridView {
        x_labels: tables.x_labels(),
        y_labels: tables.y_labels(),
        error,
        average,
        median,
        timeout_rate,
        half_timeout: half_timeout_view(&thresholds, tables, marker),
    }
}

fn half_timeout_view(
    thresholds: &[HalfTimeout],
    tables: &CoordinateTables,
    marker: &NoDataMarker,
) -> HalfTimeoutView {
    let agg = aggregate::half_timeout_aggregate(thresholds);
    HalfTimeoutView {
        labels: thresholds
            .iter()
            .map(|t| tables.probability_label(t.probability))
            .collect(),
        values: agg
            .values
            .iter()
            .map(|v| ChartValue::from_aggregate(*v, marker))
            .collect(),
    }
}

fn run_count_warnings<K: std::fmt::Display>(
    keys: &[K],
    counts: &[usize],
    expected_runs: u32,
) -> Vec<String> {
    keys.iter()
        .zip(counts)
        .filter(|(_, n)| **n != expected_runs as usize)
        .map(|(k, n)| {
            format!(
                "group {} has {} runs but {} were expected; its timeout rate is approximate",
                k, n, expected_runs
            )
        })
        .collect()
}

fn totals(parsed: &ParsedResults, orders: usize, pairs: &GroupIndex<PairKey>) -> TotalsView {
    let rows = parsed.dataset.rows();
    let mut probabilities: Vec<_> = pairs.keys().iter().map(|k| k.probability).collect();
    probabilities.sort();
    probabilities.dedup();

    TotalsView {
        rows: rows.len(),
        skipped: parsed.skipped.len(),
        successes: rows.iter().filter(|r| r.outcome.is_success()).count(),
        timeouts: rows.iter().filter(|r| r.outcome == Outcome::Timeout).count(),
        out_of_memory: rows
            .iter()
            .filter(|r| r.outcome == Outcome::OutOfMemory)
            .count(),
        found: rows.iter().filter(|r| r.found == Some(true)).count(),
        orders,
        probabilities: probabilities.len(),
    }
}
