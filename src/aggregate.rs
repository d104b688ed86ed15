//! Per-group reducers over a dataset partitioned by a [`GroupIndex`].
//!
//! Every reducer yields one value per group position. `None` is the
//! "no data" result (a group without a single successful run) and must
//! never be rendered as a number.

use crate::data::{Dataset, Outcome, Probability};
use crate::group::{GroupIndex, GroupKey, PairKey};
use serde::Serialize;
use std::collections::BTreeMap;

/// Timeout percentage at or above which a group counts as "mostly timing out".
pub const HALF_TIMEOUT_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Average,
    Median,
    TimeoutPercent,
    TimeoutCount,
    MinNodeThreshold,
}

/// One summary value per group, aligned with group positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub kind: AggregateKind,
    pub values: Vec<Option<f64>>,
}

impl Aggregate {
    pub fn get(&self, position: usize) -> Option<f64> {
        self.values.get(position).copied().flatten()
    }
}

/// Successful durations of each group, in row order.
fn durations_by_group<K: GroupKey>(dataset: &Dataset, index: &GroupIndex<K>) -> Vec<Vec<f64>> {
    let mut out = vec![Vec::new(); index.len()];
    for row in dataset.rows() {
        if let (Some(pos), Some(ms)) = (index.position_of(row), row.outcome.duration_ms()) {
            out[pos].push(ms);
        }
    }
    out
}

/// Recency-weighted running average: the first sample seeds the value,
/// every later one is folded in as `(avg + x) / 2`.
///
/// This is not the arithmetic mean; `[10, 20, 30]` gives 22.5. Historical
/// plots were produced with this rule and stay comparable.
pub fn running_average(durations: &[f64]) -> Option<f64> {
    durations
        .iter()
        .fold(None, |avg, &x| Some(avg.map_or(x, |a| (a + x) / 2.0)))
}

/// Median with 0-based midpoints: `s[n/2]` for odd `n`,
/// `(s[n/2 - 1] + s[n/2]) / 2` for even `n`.
pub fn median(durations: &[f64]) -> Option<f64> {
    if durations.is_empty() {
        return None;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

pub fn average<K: GroupKey>(dataset: &Dataset, index: &GroupIndex<K>) -> Aggregate {
    Aggregate {
        kind: AggregateKind::Average,
        values: durations_by_group(dataset, index)
            .iter()
            .map(|d| running_average(d))
            .collect(),
    }
}

pub fn median_by_group<K: GroupKey>(dataset: &Dataset, index: &GroupIndex<K>) -> Aggregate {
    Aggregate {
        kind: AggregateKind::Median,
        values: durations_by_group(dataset, index)
            .iter()
            .map(|d| median(d))
            .collect(),
    }
}

/// Approximate timeout percentage per group.
///
/// Each group starts at 100 and loses `step` (`100 / expected_runs`, see
/// [`Config::timeout_step`]) per successful run, so the result is only
/// meaningful when every group ran `expected_runs` times. Clamped at 0 when
/// a group has more successes than expected.
///
/// [`Config::timeout_step`]: crate::config::Config::timeout_step
pub fn timeout_rate<K: GroupKey>(dataset: &Dataset, index: &GroupIndex<K>, step: f64) -> Aggregate {
    let mut successes = vec![0u32; index.len()];
    for row in dataset.rows() {
        if !row.outcome.is_success() {
            continue;
        }
        if let Some(pos) = index.position_of(row) {
            successes[pos] += 1;
        }
    }
    Aggregate {
        kind: AggregateKind::TimeoutPercent,
        values: successes
            .into_iter()
            .map(|n| Some((100.0 - step * f64::from(n)).max(0.0)))
            .collect(),
    }
}

/// Actual number of timed-out runs per group.
pub fn timeout_count<K: GroupKey>(dataset: &Dataset, index: &GroupIndex<K>) -> Aggregate {
    let mut counts = vec![0u32; index.len()];
    for row in dataset.rows() {
        if row.outcome != Outcome::Timeout {
            continue;
        }
        if let Some(pos) = index.position_of(row) {
            counts[pos] += 1;
        }
    }
    Aggregate {
        kind: AggregateKind::TimeoutCount,
        values: counts.into_iter().map(|c| Some(f64::from(c))).collect(),
    }
}

/// Smallest node order reaching [`HALF_TIMEOUT_PERCENT`], per probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HalfTimeout {
    pub probability: Probability,
    /// `None` while no order of this probability reached the threshold.
    pub min_order: Option<u32>,
}

/// For each distinct probability (in the index's position order), find the
/// smallest order whose timeout rate is at least 50%.
pub fn min_nodes_to_half_timeout(
    rates: &Aggregate,
    index: &GroupIndex<PairKey>,
) -> Vec<HalfTimeout> {
    let mut order_of_probability: Vec<Probability> = Vec::new();
    let mut result: BTreeMap<Probability, Option<u32>> = BTreeMap::new();

    for (pos, key) in index.keys().iter().enumerate() {
        let best = result.entry(key.probability).or_insert_with(|| {
            order_of_probability.push(key.probability);
            None
        });
        let reached = rates
            .get(pos)
            .is_some_and(|rate| rate >= HALF_TIMEOUT_PERCENT);
        if reached && best.is_none_or(|o| key.order < o) {
            *best = Some(key.order);
        }
    }

    order_of_probability
        .into_iter()
        .map(|probability| HalfTimeout {
            probability,
            min_order: result.get(&probability).copied().flatten(),
        })
        .collect()
}

/// [`min_nodes_to_half_timeout`] as an aggregate aligned with the
/// probabilities' first-seen order.
pub fn half_timeout_aggregate(thresholds: &[HalfTimeout]) -> Aggregate {
    Aggregate {
        kind: AggregateKind::MinNodeThreshold,
        values: thresholds
            .iter()
            .map(|t| t.min_order.map(f64::from))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::group::OrderKey;
    use pretty_assertions::assert_eq;

    fn ok(order: u32, ms: f64) -> Row {
        Row::new(order, None, Outcome::Success(ms))
    }

    fn timeout(order: u32) -> Row {
        Row::new(order, None, Outcome::Timeout)
    }

    fn pair(order: u32, p: f64, outcome: Outcome) -> Row {
        Row::new(order, Probability::new(p), outcome)
    }

    #[test]
    fn running_average_weights_recent_samples() {
        assert_eq!(running_average(&[10.0, 20.0]), Some(15.0));
        assert_eq!(running_average(&[10.0, 20.0, 30.0]), Some(22.5));
        assert_eq!(running_average(&[]), None);
    }

    #[test]
    fn median_uses_zero_based_midpoints() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[5.0, 1.0, 3.0, 7.0]), Some(4.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn median_sorts_numerically() {
        // Lexical order would put 100 before 9.
        assert_eq!(median(&[100.0, 9.0, 20.0]), Some(20.0));
    }

    #[test]
    fn average_skips_failed_runs_and_reports_no_data() {
        let ds = Dataset::new(vec![
            ok(10, 100.0),
            timeout(10),
            ok(10, 200.0),
            timeout(20),
            timeout(20),
            Row::new(20, None, Outcome::OutOfMemory),
        ]);
        let index = GroupIndex::<OrderKey>::build(&ds);
        let avg = average(&ds, &index);
        assert_eq!(avg.kind, AggregateKind::Average);
        assert_eq!(avg.values, vec![Some(150.0), None]);

        let med = median_by_group(&ds, &index);
        assert_eq!(med.values, vec![Some(150.0), None]);
    }

    #[test]
    fn timeout_rate_counts_down_from_one_hundred() {
        let mut rows: Vec<Row> = (0..20).map(|i| ok(10, f64::from(i))).collect();
        rows.extend((0..20).map(|_| timeout(20)));
        let ds = Dataset::new(rows);
        let index = GroupIndex::<OrderKey>::build(&ds);

        let rates = timeout_rate(&ds, &index, 5.0);
        assert_eq!(rates.values, vec![Some(0.0), Some(100.0)]);
    }

    #[test]
    fn timeout_rate_partial_and_clamped() {
        let mut rows = vec![ok(10, 1.0), timeout(10), timeout(10), timeout(10)];
        rows.extend((0..5).map(|_| ok(20, 1.0)));
        let ds = Dataset::new(rows);
        let index = GroupIndex::<OrderKey>::build(&ds);

        let rates = timeout_rate(&ds, &index, 25.0);
        assert_eq!(rates.values, vec![Some(75.0), Some(0.0)]);
    }

    #[test]
    fn timeout_rate_does_not_accumulate_rounding() {
        let ds = Dataset::new(vec![ok(10, 1.0), ok(10, 2.0), ok(10, 3.0), timeout(20)]);
        let index = GroupIndex::<OrderKey>::build(&ds);
        let step = 100.0 / 3.0;

        let rates = timeout_rate(&ds, &index, step);
        assert_eq!(rates.values, vec![Some(0.0), Some(100.0)]);

        let ds = Dataset::new(vec![ok(10, 1.0), ok(10, 2.0)]);
        let index = GroupIndex::<OrderKey>::build(&ds);
        let rates = timeout_rate(&ds, &index, step);
        assert_eq!(rates.values, vec![Some(100.0 - 2.0 * step)]);
    }

    #[test]
    fn timeout_count_ignores_oom() {
        let ds = Dataset::new(vec![
            timeout(10),
            Row::new(10, None, Outcome::OutOfMemory),
            timeout(10),
            ok(20, 3.0),
        ]);
        let index = GroupIndex::<OrderKey>::build(&ds);
        assert_eq!(timeout_count(&ds, &index).values, vec![Some(2.0), Some(0.0)]);
    }

    #[test]
    fn half_timeout_picks_smallest_order_over_threshold() {
        // Step 50: one success → 50%, two → 0%, none → 100%.
        let ds = Dataset::new(vec![
            pair(10, 0.1, Outcome::Success(1.0)),
            pair(10, 0.1, Outcome::Success(1.0)),
            pair(30, 0.1, Outcome::Timeout),
            pair(20, 0.1, Outcome::Success(1.0)),
            pair(20, 0.1, Outcome::Timeout),
            pair(10, 0.9, Outcome::Success(1.0)),
            pair(10, 0.9, Outcome::Success(1.0)),
        ]);
        let index = GroupIndex::<PairKey>::build(&ds);
        let rates = timeout_rate(&ds, &index, 50.0);
        let thresholds = min_nodes_to_half_timeout(&rates, &index);

        assert_eq!(
            thresholds,
            vec![
                HalfTimeout {
                    probability: Probability::new(0.1).unwrap(),
                    min_order: Some(20),
                },
                HalfTimeout {
                    probability: Probability::new(0.9).unwrap(),
                    min_order: None,
                },
            ]
        );
        assert_eq!(
            half_timeout_aggregate(&thresholds).values,
            vec![Some(20.0), None]
        );
    }

    #[test]
    fn half_timeout_from_precomputed_rates() {
        let ds = Dataset::new(vec![
            pair(10, 0.1, Outcome::Timeout),
            pair(20, 0.1, Outcome::Timeout),
        ]);
        let index = GroupIndex::<PairKey>::build(&ds);
        let rates = Aggregate {
            kind: AggregateKind::TimeoutPercent,
            values: vec![Some(40.0), Some(60.0)],
        };
        let thresholds = min_nodes_to_half_timeout(&rates, &index);
        assert_eq!(thresholds[0].min_order, Some(20));
    }
}
