use serde::{Deserialize, Serialize};
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

/// Header cells longer than this are cut before being stored.
pub const MAX_HEADER_LEN: usize = 50;
/// Per-cell read failures kept on a single sheet profile.
pub const MAX_CELL_ERRORS: usize = 5;
/// Complex formulas kept as samples in the formula summary.
pub const MAX_COMPLEX_SAMPLES: usize = 5;
/// Sheets sampled when averaging consistency scores for red flags.
pub const CONSISTENCY_SAMPLE_SHEETS: usize = 10;
/// Files above this size are accepted but logged as slow to analyze.
pub const LARGE_FILE_WARNING_BYTES: u64 = 100 * 1024 * 1024;

fn default_max_file_size() -> u64 {
    // 200 MB in bytes
    200 * 1024 * 1024
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

/// Scan bounds for one assessment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub max_rows_per_sheet: usize,
    pub max_sheets: usize,
    pub max_formula_sample_len: usize,
    pub max_header_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_rows_per_sheet: 10_000,
            max_sheets: 50,
            max_formula_sample_len: 100,
            max_header_samples: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: u64,
    pub analysis: AnalysisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_file_size: default_max_file_size(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let analysis = AnalysisConfig {
            max_rows_per_sheet: parse_or(&lookup, "SHEET_AUTOMATION_MAX_ROWS", defaults.analysis.max_rows_per_sheet)?,
            max_sheets: parse_or(&lookup, "SHEET_AUTOMATION_MAX_SHEETS", defaults.analysis.max_sheets)?,
            max_formula_sample_len: parse_or(&lookup, "SHEET_AUTOMATION_MAX_FORMULA_LEN", defaults.analysis.max_formula_sample_len)?,
            max_header_samples: parse_or(&lookup, "SHEET_AUTOMATION_MAX_HEADERS", defaults.analysis.max_header_samples)?,
        };

        Ok(Config {
            bind_addr: parse_or(&lookup, "SHEET_AUTOMATION_ADDR", defaults.bind_addr)?,
            max_file_size: parse_or(&lookup, "SHEET_AUTOMATION_MAX_FILE_SIZE", defaults.max_file_size)?,
            analysis,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unset_keys_fall_back_to_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.max_file_size, 200 * 1024 * 1024);
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn overrides_are_parsed() {
        let vars: HashMap<&str, &str> = [
            ("SHEET_AUTOMATION_MAX_ROWS", "500"),
            ("SHEET_AUTOMATION_MAX_SHEETS", " 5 "),
            ("SHEET_AUTOMATION_ADDR", "0.0.0.0:8080"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.analysis.max_rows_per_sheet, 500);
        assert_eq!(config.analysis.max_sheets, 5);
        assert_eq!(config.analysis.max_header_samples, 20);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(|key| {
            (key == "SHEET_AUTOMATION_MAX_ROWS").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("SHEET_AUTOMATION_MAX_ROWS"));
    }
}
