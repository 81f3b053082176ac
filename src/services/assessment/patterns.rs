use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{PatternSummary, SheetRole, SheetRoles};

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    "january", "february", "march", "april", "june", "july", "august", "september", "october",
    "november", "december",
];
const QUARTERS: &[&str] = &["q1", "q2", "q3", "q4", "quarter"];
const YEARS: &[&str] = &["2020", "2021", "2022", "2023", "2024", "2025", "2026"];
const PERIODS: &[&str] = &["week", "daily", "monthly", "annual", "yearly"];

const TIME_VOCABULARIES: [&[&str]; 4] = [MONTHS, QUARTERS, YEARS, PERIODS];

/// Keyword sets tested in order; the first role with a hit claims the sheet.
const ROLE_RULES: [(SheetRole, &[&str]); 5] = [
    (SheetRole::DataEntry, &["input", "entry", "data", "raw", "import", "source", "form"]),
    (SheetRole::Calculation, &["calc", "calculation", "compute", "process", "analysis", "logic"]),
    (SheetRole::Reporting, &["report", "dashboard", "output", "results", "final"]),
    (SheetRole::Template, &["template", "master", "base", "model", "standard"]),
    (SheetRole::Summary, &["summary", "total", "consolidated", "overview", "aggregate"]),
];

/// Generic page-like names that default to data entry when no rule matched.
const PAGE_TOKENS: &[&str] = &["sheet", "tab", "page"];

const DIGIT_GROUPS: &str = r"[0-9]+";
const MONTH_SUFFIX: &str = r"(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec).*";

static BASE_NAME_RULES: Lazy<Result<(Regex, Regex), regex::Error>> =
    Lazy::new(|| Ok((Regex::new(DIGIT_GROUPS)?, Regex::new(MONTH_SUFFIX)?)));

pub const END_TO_END_INDICATOR: &str = "End-to-end data processing pipeline";
pub const MULTI_SOURCE_INDICATOR: &str = "Multi-source data aggregation";

/// Infers business-process structure from sheet names alone.
pub fn detect(sheet_names: &[String]) -> PatternSummary {
    tracing::info!("Detecting automation patterns...");
    let mut summary = PatternSummary::default();

    let time_based = sheet_names.iter().filter(|name| is_time_based(name)).count();
    if time_based >= 2 {
        summary.time_based_patterns = true;
        summary.pattern_score += 30;
        summary.detected_patterns.push("Time-based sheet structure detected".to_string());
        summary
            .business_process_indicators
            .push("Periodic reporting process".to_string());
    }

    if sheet_names.len() >= 3 {
        match has_repeated_structure(sheet_names) {
            Ok(true) => {
                summary.repeated_structures = true;
                summary.pattern_score += 25;
                summary
                    .detected_patterns
                    .push("Repeated sheet naming patterns detected".to_string());
                summary
                    .business_process_indicators
                    .push("Template-based workflow".to_string());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Repeated structure detection failed: {}", e);
                summary
                    .analysis_errors
                    .push(format!("Repeated structure detection failed: {}", e));
            }
        }
    }

    for name in sheet_names {
        if let Some(role) = categorize(name) {
            summary.roles.push(role, name.clone());
        }
    }
    let roles = &summary.roles;

    let data_sources = roles.data_entry.len();
    let reporting_outputs = roles.reporting.len() + roles.summary.len();
    if data_sources >= 2 && reporting_outputs >= 1 {
        summary.consolidation_patterns = true;
        summary.pattern_score += 20;
        summary
            .detected_patterns
            .push("Data consolidation workflow detected".to_string());
        summary
            .business_process_indicators
            .push(MULTI_SOURCE_INDICATOR.to_string());
    }

    let templates = summary.roles.template.len();
    if templates > 0 && sheet_names.len() - templates >= 2 {
        summary.pattern_score += 15;
        summary
            .detected_patterns
            .push("Master template with variations".to_string());
        summary
            .business_process_indicators
            .push("Standardized reporting process".to_string());
    }

    if has_full_pipeline(&summary.roles) {
        summary.pattern_score += 25;
        summary
            .detected_patterns
            .push("Complete business process workflow".to_string());
        summary
            .business_process_indicators
            .push(END_TO_END_INDICATOR.to_string());
    }

    if summary.detected_patterns.len() >= 3 {
        summary.pattern_score += 10;
        summary
            .business_process_indicators
            .push("Multi-pattern business process".to_string());
    }

    tracing::info!("Pattern analysis complete. Score: {}", summary.pattern_score);
    summary
}

fn is_time_based(name: &str) -> bool {
    let lower = name.to_lowercase();
    TIME_VOCABULARIES
        .iter()
        .any(|vocabulary| vocabulary.iter().any(|token| lower.contains(token)))
}

/// Role for a sheet name; at most one role ever matches.
pub fn categorize(name: &str) -> Option<SheetRole> {
    let lower = name.to_lowercase();
    ROLE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(role, _)| *role)
        .or_else(|| {
            PAGE_TOKENS
                .iter()
                .any(|token| lower.contains(token))
                .then_some(SheetRole::DataEntry)
        })
}

/// Name with digit groups and any month-name tail removed, lower-cased.
pub fn base_name(name: &str, digits: &Regex, month_suffix: &Regex) -> String {
    let without_digits = digits.replace_all(name, "");
    let lower = without_digits.trim().to_lowercase();
    month_suffix.replace(&lower, "").trim().to_string()
}

fn has_repeated_structure(sheet_names: &[String]) -> Result<bool, regex::Error> {
    let (digits, month_suffix) = BASE_NAME_RULES.as_ref().map_err(Clone::clone)?;

    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    for name in sheet_names {
        let base = base_name(name, digits, month_suffix);
        if base.chars().count() >= 2 {
            *groups.entry(base).or_insert(0) += 1;
        }
    }
    Ok(groups.values().any(|&count| count >= 2))
}

fn has_full_pipeline(roles: &SheetRoles) -> bool {
    [SheetRole::DataEntry, SheetRole::Calculation, SheetRole::Reporting]
        .into_iter()
        .all(|role| !roles.get(role).is_empty())
}
