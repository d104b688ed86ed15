//! Parsing for benchmark result files.

pub mod parse;
pub mod row;

pub use parse::{ParsedResults, RowError, SkippedRow, parse_results, parse_results_file};
pub use row::{Dataset, Outcome, Probability, Row};
