use std::collections::BTreeMap;

use super::StageError;
use crate::config::MAX_COMPLEX_SAMPLES;
use crate::models::{FormulaSummary, SheetProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaComplexity {
    Complex,
    Moderate,
    Simple,
    Unknown,
}

impl FormulaComplexity {
    /// Moderate formulas tally as simple; unrecognised logic tallies as complex.
    pub fn counts_as_complex(self) -> bool {
        matches!(self, FormulaComplexity::Complex | FormulaComplexity::Unknown)
    }
}

/// Vocabularies checked in order; the first category with a hit wins.
const COMPLEXITY_RULES: [(FormulaComplexity, &[&str]); 3] = [
    (
        FormulaComplexity::Complex,
        &[
            "INDIRECT", "OFFSET", "INDEX", "MATCH", "VLOOKUP", "HLOOKUP", "XLOOKUP", "SUMPRODUCT",
            "ARRAY", "MMULT", "TRANSPOSE", "PIVOT", "GETPIVOTDATA", "CUBE", "HYPERLINK",
        ],
    ),
    (
        FormulaComplexity::Moderate,
        &[
            "SUMIF", "COUNTIF", "AVERAGEIF", "SUMIFS", "COUNTIFS", "AVERAGEIFS", "IFERROR", "IFNA",
            "CHOOSE", "SWITCH", "IFS",
        ],
    ),
    (
        FormulaComplexity::Simple,
        &[
            "SUM", "AVERAGE", "COUNT", "MAX", "MIN", "IF", "CONCATENATE", "CONCAT", "LEFT", "RIGHT",
            "MID", "LEN", "UPPER", "LOWER", "ROUND", "ABS", "SQRT",
        ],
    ),
];

pub fn classify(formula: &str) -> FormulaComplexity {
    let upper = formula.to_uppercase();
    COMPLEXITY_RULES
        .iter()
        .find(|(_, vocabulary)| vocabulary.iter().any(|func| upper.contains(func)))
        .map(|(complexity, _)| *complexity)
        .unwrap_or(FormulaComplexity::Unknown)
}

/// Aggregates formula inventories across scanned sheets and scores how hard
/// the workbook's logic would be to reproduce.
///
/// Fails only when there were sheets to scan and none of them could be read.
pub fn analyze(profiles: &[SheetProfile]) -> Result<FormulaSummary, StageError> {
    tracing::info!("Analyzing formulas across {} sheets...", profiles.len());

    let readable: Vec<&SheetProfile> = profiles.iter().filter(|p| p.scan_complete).collect();
    if readable.is_empty() && !profiles.is_empty() {
        return Err(StageError::NoReadableSheets {
            attempted: profiles.len(),
        });
    }

    let mut formula_types_summary: BTreeMap<String, usize> = BTreeMap::new();
    let mut complex_formulas = Vec::new();
    let mut simple_count = 0usize;
    let mut total_formulas = 0usize;

    for profile in &readable {
        for (func, count) in &profile.formula_types {
            *formula_types_summary.entry(func.clone()).or_insert(0) += count;
        }
        for formula in &profile.formulas {
            total_formulas += 1;
            if classify(formula).counts_as_complex() {
                complex_formulas.push(formula);
            } else {
                simple_count += 1;
            }
        }
    }

    let complex_count = complex_formulas.len();
    let formula_complexity_ratio = if total_formulas == 0 {
        0.0
    } else {
        complex_count as f64 / total_formulas as f64
    };

    let summary = FormulaSummary {
        total_formulas,
        complex_formulas: complex_count,
        simple_formulas: simple_count,
        formula_complexity_ratio,
        formula_types_summary,
        most_complex_formulas: complex_formulas
            .into_iter()
            .take(MAX_COMPLEX_SAMPLES)
            .cloned()
            .collect(),
        automation_difficulty_score: difficulty_score(total_formulas, formula_complexity_ratio),
        sheets_analyzed: readable.len(),
    };

    tracing::info!(
        "Formula analysis complete. Total: {}, Complex: {}, Difficulty: {}/100",
        summary.total_formulas,
        summary.complex_formulas,
        summary.automation_difficulty_score
    );
    Ok(summary)
}

pub fn difficulty_score(total_formulas: usize, complexity_ratio: f64) -> u8 {
    if total_formulas == 0 {
        return 20;
    }

    let mut score: u32 = if complexity_ratio > 0.6 {
        85
    } else if complexity_ratio > 0.4 {
        70
    } else if complexity_ratio > 0.2 {
        50
    } else {
        25
    };

    if total_formulas > 1000 {
        score += 10;
    } else if total_formulas > 100 {
        score += 5;
    }

    score.min(100) as u8
}

impl FormulaSummary {
    /// Used when the analyzer cannot run: assume the logic is hard to automate.
    pub fn assume_hard() -> Self {
        FormulaSummary {
            automation_difficulty_score: 100,
            ..FormulaSummary::default()
        }
    }
}
