use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Result of a single benchmark run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Query finished; duration in milliseconds.
    Success(f64),
    Timeout,
    OutOfMemory,
}

impl Outcome {
    pub fn duration_ms(&self) -> Option<f64> {
        match self {
            Outcome::Success(ms) => Some(*ms),
            Outcome::Timeout | Outcome::OutOfMemory => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Edge probability of the random graph generator, in [0, 1].
///
/// Totally ordered so it can key a `BTreeMap`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Probability(f64);

impl Probability {
    /// Returns `None` outside [0, 1] or for NaN.
    pub fn new(p: f64) -> Option<Self> {
        (0.0..=1.0).contains(&p).then_some(Self(p))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Probability {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Probability {}

impl PartialOrd for Probability {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Probability {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single parsed observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Node count of the graph instance, always > 0.
    pub order: u32,
    /// Absent when the file has no `edge probability` column.
    pub probability: Option<Probability>,
    pub outcome: Outcome,
    /// Value of the optional `found` column.
    pub found: Option<bool>,
}

impl Row {
    pub fn new(order: u32, probability: Option<Probability>, outcome: Outcome) -> Self {
        Self {
            order,
            probability,
            outcome,
            found: None,
        }
    }
}

/// Rows of one input file, in file order. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_probabilities(&self) -> bool {
        self.rows.iter().any(|r| r.probability.is_some())
    }
}
