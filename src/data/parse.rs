use crate::Result;
use crate::data::row::{Dataset, Outcome, Probability, Row};
use crate::diagnostics;

use anyhow::{Context, bail};
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use thiserror::Error;

pub const ORDER_COLUMN: &str = "order";
pub const PROBABILITY_COLUMN: &str = "edge probability";
pub const TIME_COLUMN: &str = "query execution time";
pub const FOUND_COLUMN: &str = "found";

/// Why a single row was dropped. Never aborts the whole file.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RowError {
    #[error("missing field {0:?}")]
    MissingField(&'static str),
    #[error("order must be a positive integer, got {0:?}")]
    InvalidOrder(String),
    #[error("edge probability must be a number in [0, 1], got {0:?}")]
    InvalidProbability(String),
    #[error("execution time is neither a number nor timeout/OOM: {0:?}")]
    AmbiguousOutcome(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the input file, when known.
    pub line: Option<u64>,
    pub reason: RowError,
}

/// Parse output: the usable rows plus everything that was skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedResults {
    pub dataset: Dataset,
    pub skipped: Vec<SkippedRow>,
}

/// Column positions resolved from the (trimmed) header row.
struct Columns {
    order: usize,
    time: usize,
    probability: Option<usize>,
    found: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord, source: &str) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let Some(order) = find(ORDER_COLUMN) else {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "{}: header has no {:?} column",
                    source, ORDER_COLUMN
                ))
            );
        };
        let Some(time) = find(TIME_COLUMN) else {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "{}: header has no {:?} column",
                    source, TIME_COLUMN
                ))
            );
        };

        Ok(Self {
            order,
            time,
            probability: find(PROBABILITY_COLUMN),
            found: find(FOUND_COLUMN),
        })
    }
}

/// Parse a benchmark result file from disk.
pub fn parse_results_file(path: &str) -> Result<ParsedResults> {
    let file = File::open(path)
        .with_context(|| diagnostics::error_message(format!("read results file {}", path)))?;
    parse_results(file, path)
}

/// Parse comma-separated benchmark results.
///
/// Expected header (extra columns are ignored, names are trimmed):
/// order,edge probability,query execution time,found,timestamp
///
/// Example row:
/// 20,0.3,1532,true,14:02:11
///
/// `edge probability` and `found` are optional. Rows that cannot be
/// interpreted are collected in `skipped` instead of failing the file.
pub fn parse_results<R: Read>(reader: R, source: &str) -> Result<ParsedResults> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .with_context(|| diagnostics::error_message(format!("read header of {}", source)))?
        .clone();
    let columns = Columns::resolve(&headers, source)?;

    // Plain decimal milliseconds; sentinels are matched before this.
    const DURATION_RE: &str = r#"^[0-9]+(?:\.[0-9]+)?$"#;
    let duration_re = Regex::new(DURATION_RE)?;

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for record in rdr.records() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                skipped.push(SkippedRow {
                    line: err.position().map(|p| p.line()),
                    reason: RowError::Malformed(err.to_string()),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line());

        match parse_row(&record, &columns, &duration_re) {
            Ok(row) => rows.push(row),
            Err(reason) => skipped.push(SkippedRow { line, reason }),
        }
    }

    for s in &skipped {
        diagnostics::warn(format!(
            "skipping row at {}:{}: {}",
            source,
            s.line.map(|l| l.to_string()).unwrap_or_else(|| "?".to_string()),
            s.reason
        ));
    }

    Ok(ParsedResults {
        dataset: Dataset::new(rows),
        skipped,
    })
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &Columns,
    duration_re: &Regex,
) -> std::result::Result<Row, RowError> {
    let field = |idx: usize, name: &'static str| {
        record
            .get(idx)
            .filter(|s| !s.is_empty())
            .ok_or(RowError::MissingField(name))
    };

    let order_str = field(columns.order, ORDER_COLUMN)?;
    let order = order_str
        .parse::<u32>()
        .ok()
        .filter(|o| *o > 0)
        .ok_or_else(|| RowError::InvalidOrder(order_str.to_string()))?;

    let probability = match columns.probability {
        Some(idx) => {
            let p_str = field(idx, PROBABILITY_COLUMN)?;
            let p = p_str
                .parse::<f64>()
                .ok()
                .and_then(Probability::new)
                .ok_or_else(|| RowError::InvalidProbability(p_str.to_string()))?;
            Some(p)
        }
        None => None,
    };

    let outcome = parse_outcome(field(columns.time, TIME_COLUMN)?, duration_re)?;

    // An unreadable `found` is not worth dropping the measurement for.
    let found = columns
        .found
        .and_then(|idx| record.get(idx))
        .and_then(|s| match s.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        });

    Ok(Row {
        order,
        probability,
        outcome,
        found,
    })
}

fn parse_outcome(s: &str, duration_re: &Regex) -> std::result::Result<Outcome, RowError> {
    if s.eq_ignore_ascii_case("timeout") {
        return Ok(Outcome::Timeout);
    }
    if s.eq_ignore_ascii_case("oom") || s.eq_ignore_ascii_case("outofmemory") {
        return Ok(Outcome::OutOfMemory);
    }
    if !duration_re.is_match(s) {
        return Err(RowError::AmbiguousOutcome(s.to_string()));
    }
    s.parse::<f64>()
        .map(Outcome::Success)
        .map_err(|_| RowError::AmbiguousOutcome(s.to_string()))
}
