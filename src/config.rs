//! Report configuration (config.json).
//!
//! JSON shape (every field optional):
//! {
//!   "expected_runs": 20,
//!   "no_data": { "label": "∞", "color": "#d62728" }
//! }

use crate::Result;
use crate::diagnostics;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;

pub const DEFAULT_EXPECTED_RUNS: u32 = 20;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Runs the benchmark performed per group. The timeout-rate step is
    /// `100 / expected_runs`.
    pub expected_runs: u32,

    pub no_data: NoDataMarker,
}

/// How groups without a successful run are drawn.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoDataMarker {
    pub label: String,
    pub color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expected_runs: DEFAULT_EXPECTED_RUNS,
            no_data: NoDataMarker::default(),
        }
    }
}

impl Default for NoDataMarker {
    fn default() -> Self {
        Self {
            label: "∞".to_string(),
            color: "#d62728".to_string(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)
            .with_context(|| diagnostics::error_message("parse config"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| diagnostics::error_message(format!("read config file {}", path)))?;
        Self::from_json(&text).with_context(|| format!("in {}", path))
    }

    /// Load `path` if given, then apply command-line overrides.
    pub fn resolve(path: Option<&str>, expected_runs: Option<u32>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        if let Some(runs) = expected_runs {
            config.expected_runs = runs;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.expected_runs == 0 {
            bail!(
                "{}",
                diagnostics::error_message("expected_runs must be greater than 0")
            );
        }
        Ok(())
    }

    /// Percentage points removed per successful run.
    pub fn timeout_step(&self) -> f64 {
        100.0 / f64::from(self.expected_runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
        assert_eq!(Config::default().timeout_step(), 5.0);
    }

    #[test]
    fn partial_marker_keeps_other_defaults() {
        let config = Config::from_json(r#"{"expected_runs": 10, "no_data": {"label": "n/a"}}"#)
            .unwrap();
        assert_eq!(config.expected_runs, 10);
        assert_eq!(config.no_data.label, "n/a");
        assert_eq!(config.no_data.color, NoDataMarker::default().color);
        assert_eq!(config.timeout_step(), 10.0);
    }

    #[test]
    fn zero_expected_runs_is_rejected() {
        assert!(Config::from_json(r#"{"expected_runs": 0}"#).is_err());
        assert!(Config::resolve(None, Some(0)).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::from_json(r#"{"expected_run": 10}"#).is_err());
    }

    #[test]
    fn override_wins_over_default() {
        assert_eq!(Config::resolve(None, Some(4)).unwrap().expected_runs, 4);
    }
}
