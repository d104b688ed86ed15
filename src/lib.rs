//! Aggregation and chart-series formatting for graph-benchmark result files.
//!
//! Pipeline: parse CSV rows → build a grouping index → run aggregators →
//! format chart series → render an HTML report.

pub mod aggregate;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod group;
pub mod model;
pub mod render;
pub mod series;

pub type Result<T> = anyhow::Result<T>;
