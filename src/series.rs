//! Chart-ready series: ordered value arrays for line/bar charts and
//! `[x, y, value]` triples for heatmaps.

use crate::aggregate::Aggregate;
use crate::config::NoDataMarker;
use crate::data::Probability;
use crate::group::{GroupIndex, OrderKey, PairKey};
use serde::Serialize;
use serde::ser::{SerializeTuple, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Canonical edge probabilities of the benchmark runner, 0.1 through 1.0.
pub const CANONICAL_PROBABILITY_STEPS: usize = 10;

/// Probabilities closer than this to a canonical entry map onto it.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("edge probability {0} has no heatmap row (expected one of 0.1, 0.2, ..., 1.0)")]
    UnmappedProbability(f64),
    #[error("order {0} has no heatmap column")]
    UnmappedOrder(u32),
}

/// A value as handed to the chart: a number, or the "no data" marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartValue {
    Number(f64),
    NoData { label: String, color: String },
}

impl ChartValue {
    pub fn from_aggregate(value: Option<f64>, marker: &NoDataMarker) -> Self {
        match value {
            Some(v) => ChartValue::Number(v),
            None => ChartValue::NoData {
                label: marker.label.clone(),
                color: marker.color.clone(),
            },
        }
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            ChartValue::Number(v) => Some(*v),
            ChartValue::NoData { .. } => None,
        }
    }
}

/// A heatmap cell, serialized as `[x, y, value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub x: usize,
    pub y: usize,
    pub value: ChartValue,
}

impl Serialize for Triple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(3)?;
        t.serialize_element(&self.x)?;
        t.serialize_element(&self.y)?;
        t.serialize_element(&self.value)?;
        t.end()
    }
}

/// Order → x index (ascending) and probability → y index (canonical table).
#[derive(Debug, Clone)]
pub struct CoordinateTables {
    orders: BTreeMap<u32, usize>,
    order_labels: Vec<u32>,
    probabilities: Vec<Probability>,
}

impl CoordinateTables {
    /// X axis from the given orders (sorted, deduplicated); Y axis is the
    /// canonical probability table.
    pub fn new(orders: impl IntoIterator<Item = u32>) -> Self {
        let mut order_labels: Vec<u32> = orders.into_iter().collect();
        order_labels.sort_unstable();
        order_labels.dedup();
        let orders = order_labels
            .iter()
            .enumerate()
            .map(|(i, o)| (*o, i))
            .collect();
        Self {
            orders,
            order_labels,
            probabilities: canonical_probabilities(),
        }
    }

    pub fn from_index(index: &GroupIndex<OrderKey>) -> Self {
        Self::new(index.keys().iter().map(|k| k.0))
    }

    pub fn x_of(&self, order: u32) -> Result<usize, CoordinateError> {
        self.orders
            .get(&order)
            .copied()
            .ok_or(CoordinateError::UnmappedOrder(order))
    }

    pub fn y_of(&self, probability: Probability) -> Result<usize, CoordinateError> {
        self.probabilities
            .iter()
            .position(|c| (c.value() - probability.value()).abs() < PROBABILITY_TOLERANCE)
            .ok_or(CoordinateError::UnmappedProbability(probability.value()))
    }

    /// Inverse lookup of a heatmap cell.
    pub fn locate(&self, x: usize, y: usize) -> Option<(u32, Probability)> {
        Some((*self.order_labels.get(x)?, *self.probabilities.get(y)?))
    }

    pub fn x_labels(&self) -> Vec<String> {
        self.order_labels.iter().map(u32::to_string).collect()
    }

    pub fn y_labels(&self) -> Vec<String> {
        self.probabilities.iter().map(|p| format_probability(*p)).collect()
    }

    /// Axis label of the canonical row `probability` maps onto. Off-grid
    /// values keep their own spelling so distinct values stay distinct.
    pub fn probability_label(&self, probability: Probability) -> String {
        match self.y_of(probability) {
            Ok(y) => format_probability(self.probabilities[y]),
            Err(_) => probability.to_string(),
        }
    }
}

fn format_probability(p: Probability) -> String {
    format!("{:.1}", p.value())
}

fn canonical_probabilities() -> Vec<Probability> {
    (1..=CANONICAL_PROBABILITY_STEPS)
        .filter_map(|i| Probability::new(i as f64 / CANONICAL_PROBABILITY_STEPS as f64))
        .collect()
}

/// Category labels plus values for a 1D chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub labels: Vec<String>,
    pub values: Vec<ChartValue>,
}

/// Align an order-keyed aggregate with its (sorted) category labels.
pub fn line_series(
    aggregate: &Aggregate,
    index: &GroupIndex<OrderKey>,
    marker: &NoDataMarker,
) -> LineSeries {
    LineSeries {
        labels: index.keys().iter().map(|k| k.to_string()).collect(),
        values: (0..index.len())
            .map(|pos| ChartValue::from_aggregate(aggregate.get(pos), marker))
            .collect(),
    }
}

/// One triple per (order, probability) group. Any key missing from the
/// coordinate tables fails the whole heatmap.
pub fn heatmap_triples(
    aggregate: &Aggregate,
    index: &GroupIndex<PairKey>,
    tables: &CoordinateTables,
    marker: &NoDataMarker,
) -> Result<Vec<Triple>, CoordinateError> {
    index
        .keys()
        .iter()
        .enumerate()
        .map(|(pos, key)| {
            Ok(Triple {
                x: tables.x_of(key.order)?,
                y: tables.y_of(key.probability)?,
                value: ChartValue::from_aggregate(aggregate.get(pos), marker),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{self, AggregateKind};
    use crate::data::{Dataset, Outcome, Row};
    use pretty_assertions::assert_eq;

    fn marker() -> NoDataMarker {
        NoDataMarker::default()
    }

    fn pair(order: u32, p: f64, outcome: Outcome) -> Row {
        Row::new(order, Probability::new(p), outcome)
    }

    #[test]
    fn canonical_table_has_ten_rows() {
        let tables = CoordinateTables::new([10]);
        assert_eq!(
            tables.y_labels(),
            vec!["0.1", "0.2", "0.3", "0.4", "0.5", "0.6", "0.7", "0.8", "0.9", "1.0"]
        );
        assert_eq!(tables.y_of(Probability::new(0.3).unwrap()), Ok(2));
        assert_eq!(tables.y_of(Probability::new(1.0).unwrap()), Ok(9));
    }

    #[test]
    fn runner_float_spellings_get_canonical_labels() {
        let tables = CoordinateTables::new([10]);
        let label = |p: f64| tables.probability_label(Probability::new(p).unwrap());
        assert_eq!(label(0.30000000000000004), "0.3");
        assert_eq!(label(0.7999999999999999), "0.8");
        assert_eq!(label(0.9999999999999999), "1.0");
        assert_eq!(label(0.25), "0.25");
    }

    #[test]
    fn off_grid_probability_is_reported() {
        let tables = CoordinateTables::new([10]);
        assert_eq!(
            tables.y_of(Probability::new(0.25).unwrap()),
            Err(CoordinateError::UnmappedProbability(0.25))
        );
        assert_eq!(tables.x_of(99), Err(CoordinateError::UnmappedOrder(99)));
    }

    #[test]
    fn orders_are_indexed_ascending() {
        let tables = CoordinateTables::new([30, 10, 20, 10]);
        assert_eq!(tables.x_labels(), vec!["10", "20", "30"]);
        assert_eq!(tables.x_of(30), Ok(2));
    }

    #[test]
    fn no_data_becomes_a_marker() {
        let m = marker();
        assert_eq!(ChartValue::from_aggregate(Some(-1.0), &m), ChartValue::Number(-1.0));
        let missing = ChartValue::from_aggregate(None, &m);
        assert_eq!(missing.number(), None);
        assert_eq!(
            serde_json::to_string(&missing).unwrap(),
            format!(r##"{{"label":"{}","color":"{}"}}"##, m.label, m.color)
        );
    }

    #[test]
    fn heatmap_triples_round_trip_through_tables() {
        let ds = Dataset::new(vec![
            pair(20, 0.3, Outcome::Success(8.0)),
            pair(10, 1.0, Outcome::Timeout),
        ]);
        let orders = GroupIndex::<OrderKey>::build(&ds).sorted();
        let pairs = GroupIndex::<PairKey>::build(&ds);
        let tables = CoordinateTables::from_index(&orders);

        let avg = aggregate::average(&ds, &pairs);
        let triples = heatmap_triples(&avg, &pairs, &tables, &marker()).unwrap();

        assert_eq!(triples[0].x, 1);
        assert_eq!(triples[0].y, 2);
        assert_eq!(triples[0].value, ChartValue::Number(8.0));
        assert_eq!(serde_json::to_string(&triples[0]).unwrap(), "[1,2,8.0]");

        for (triple, key) in triples.iter().zip(pairs.keys()) {
            assert_eq!(
                tables.locate(triple.x, triple.y),
                Some((key.order, key.probability))
            );
        }
        assert_eq!(tables.locate(5, 0), None);
    }

    #[test]
    fn heatmap_fails_loudly_on_unmapped_probability() {
        let ds = Dataset::new(vec![pair(10, 0.15, Outcome::Success(1.0))]);
        let pairs = GroupIndex::<PairKey>::build(&ds);
        let tables = CoordinateTables::new([10]);
        let agg = Aggregate {
            kind: AggregateKind::Average,
            values: vec![Some(1.0)],
        };
        assert_eq!(
            heatmap_triples(&agg, &pairs, &tables, &marker()),
            Err(CoordinateError::UnmappedProbability(0.15))
        );
    }

    #[test]
    fn line_series_scenario() {
        let ds = Dataset::new(vec![
            Row::new(10, None, Outcome::Success(100.0)),
            Row::new(10, None, Outcome::Timeout),
            Row::new(10, None, Outcome::Success(200.0)),
            Row::new(20, None, Outcome::Timeout),
            Row::new(20, None, Outcome::Timeout),
            Row::new(20, None, Outcome::Timeout),
        ]);
        let index = GroupIndex::<OrderKey>::build(&ds).sorted();
        let series = line_series(&aggregate::average(&ds, &index), &index, &marker());

        assert_eq!(series.labels, vec!["10", "20"]);
        assert_eq!(series.values[0], ChartValue::Number(150.0));
        assert_eq!(series.values[1].number(), None);
    }
}
