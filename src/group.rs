//! Grouping index: composite key → ordinal group position.
//!
//! Positions follow first-seen order in the dataset unless the index is
//! explicitly re-sorted (axis labels want ascending node counts).

use crate::data::{Dataset, Probability, Row};
use std::collections::BTreeMap;
use std::fmt;

/// A key that partitions rows into groups.
pub trait GroupKey: Ord + Clone {
    /// `None` excludes the row from this kind of grouping.
    fn of(row: &Row) -> Option<Self>;
}

/// 1D grouping by node order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey(pub u32);

/// 2D grouping by (node order, edge probability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PairKey {
    pub order: u32,
    pub probability: Probability,
}

impl GroupKey for OrderKey {
    fn of(row: &Row) -> Option<Self> {
        Some(OrderKey(row.order))
    }
}

impl GroupKey for PairKey {
    fn of(row: &Row) -> Option<Self> {
        row.probability.map(|probability| PairKey {
            order: row.order,
            probability,
        })
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.order, self.probability)
    }
}

#[derive(Debug, Clone)]
pub struct GroupIndex<K: GroupKey> {
    /// Keys by position; `keys[i]` has position `i`.
    keys: Vec<K>,
    positions: BTreeMap<K, usize>,
}

impl<K: GroupKey> GroupIndex<K> {
    /// Assign positions in first-seen order.
    pub fn build(dataset: &Dataset) -> Self {
        let mut keys = Vec::new();
        let mut positions = BTreeMap::new();
        for key in dataset.rows().iter().filter_map(K::of) {
            if !positions.contains_key(&key) {
                positions.insert(key.clone(), keys.len());
                keys.push(key);
            }
        }
        Self { keys, positions }
    }

    /// Reassign positions in ascending key order.
    pub fn sorted(mut self) -> Self {
        self.keys.sort();
        self.positions = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        self
    }

    pub fn position(&self, key: &K) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Position of the group this row belongs to, if any.
    pub fn position_of(&self, row: &Row) -> Option<usize> {
        K::of(row).and_then(|k| self.position(&k))
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of rows in each group, by position.
    pub fn counts(&self, dataset: &Dataset) -> Vec<usize> {
        let mut counts = vec![0; self.len()];
        for pos in dataset.rows().iter().filter_map(|r| self.position_of(r)) {
            counts[pos] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Outcome;
    use pretty_assertions::assert_eq;

    fn row(order: u32, p: f64) -> Row {
        Row::new(order, Probability::new(p), Outcome::Success(1.0))
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            row(30, 0.2),
            row(10, 0.1),
            row(30, 0.2),
            row(20, 0.1),
            row(10, 0.2),
        ])
    }

    #[test]
    fn positions_follow_first_seen_order() {
        let index = GroupIndex::<OrderKey>::build(&dataset());
        assert_eq!(index.keys(), &[OrderKey(30), OrderKey(10), OrderKey(20)]);
        assert_eq!(index.position(&OrderKey(10)), Some(1));
    }

    #[test]
    fn sorted_reassigns_ascending() {
        let index = GroupIndex::<OrderKey>::build(&dataset()).sorted();
        assert_eq!(index.keys(), &[OrderKey(10), OrderKey(20), OrderKey(30)]);
        assert_eq!(index.position(&OrderKey(30)), Some(2));
    }

    #[test]
    fn positions_are_a_permutation_without_gaps() {
        let index = GroupIndex::<PairKey>::build(&dataset());
        let mut positions: Vec<usize> = index
            .keys()
            .iter()
            .filter_map(|k| index.position(k))
            .collect();
        positions.sort();
        assert_eq!(positions, (0..index.len()).collect::<Vec<_>>());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn build_is_deterministic() {
        let a = GroupIndex::<PairKey>::build(&dataset());
        let b = GroupIndex::<PairKey>::build(&dataset());
        assert_eq!(a.keys(), b.keys());
    }

    #[test]
    fn rows_without_probability_are_not_paired() {
        let ds = Dataset::new(vec![Row::new(10, None, Outcome::Timeout), row(10, 0.5)]);
        let index = GroupIndex::<PairKey>::build(&ds);
        assert_eq!(index.len(), 1);
        assert_eq!(index.counts(&ds), vec![1]);
    }
}
