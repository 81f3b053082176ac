use crate::config::CONSISTENCY_SAMPLE_SHEETS;
use crate::models::{FormulaSummary, SheetProfile, StructureReport};

use super::sheet::consistency_score;

/// Function tags whose presence in the histogram implies macro-driven logic.
/// The sheet scan only tags SUM through OFFSET, so these match histograms
/// merged from other sources, never a plain scan.
const MACRO_TAGS: [&str; 4] = ["CALL", "RUN", "PERSONAL", "APPLICATION"];

/// Everything the risk scan looks at, borrowed from earlier stages.
#[derive(Debug, Clone, Copy)]
pub struct RiskInputs<'a> {
    pub structure: &'a StructureReport,
    pub formulas: &'a FormulaSummary,
    pub profiles: &'a [SheetProfile],
    /// Profiles of the leading sheets used for the consistency average.
    pub consistency_sample: &'a [SheetProfile],
    /// Macro signal from the container: VBA archive or macro-enabled extension.
    pub container_macros: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedFlagReport {
    pub flags: Vec<String>,
    pub has_macros: bool,
}

pub fn detect(inputs: RiskInputs<'_>) -> RedFlagReport {
    tracing::info!("Identifying automation red flags...");
    let RiskInputs {
        structure,
        formulas,
        profiles,
        consistency_sample,
        container_macros,
    } = inputs;
    let mut flags = Vec::new();

    if structure.file_size_mb > 100.0 {
        flags.push(format!(
            "Very large file size ({:.1}MB) - may cause performance issues",
            structure.file_size_mb
        ));
    } else if structure.file_size_mb > 50.0 {
        flags.push(format!(
            "Large file size ({:.1}MB) - requires optimization considerations",
            structure.file_size_mb
        ));
    }

    if structure.total_sheets > 30 {
        flags.push(format!(
            "Excessive number of sheets ({}) - increases automation complexity",
            structure.total_sheets
        ));
    } else if structure.total_sheets > 20 {
        flags.push(format!(
            "High number of sheets ({}) - may require phased automation approach",
            structure.total_sheets
        ));
    }

    if formulas.formula_complexity_ratio > 0.7 {
        flags.push(
            "Very high complex formula ratio (>70%) - significant logic replication required"
                .to_string(),
        );
    } else if formulas.formula_complexity_ratio > 0.5 {
        flags.push(
            "High complex formula ratio (>50%) - moderate logic replication required".to_string(),
        );
    }

    if formulas.total_formulas > 2000 {
        flags.push(format!(
            "Very high formula count ({}) - extensive logic to replicate",
            formulas.total_formulas
        ));
    } else if formulas.total_formulas > 1000 {
        flags.push(format!(
            "High formula count ({}) - substantial automation effort required",
            formulas.total_formulas
        ));
    }

    flags.extend(sheet_flags(profiles, structure.total_sheets));

    if structure.has_hidden_sheets {
        flags.push("Hidden sheets detected - may contain critical logic or data".to_string());
    }
    if structure.has_very_hidden_sheets {
        flags.push(
            "Very hidden sheets detected - likely contains sensitive or complex logic".to_string(),
        );
    }

    let has_macros = container_macros
        || MACRO_TAGS
            .iter()
            .any(|tag| formulas.formula_types_summary.contains_key(*tag));
    if has_macros {
        flags.push("VBA macros detected - requires specialized automation approach".to_string());
    }

    if let Some(average) = consistency_average(consistency_sample) {
        if average < 40.0 {
            flags.push(
                "Low data consistency across sheets - requires cleanup before automation"
                    .to_string(),
            );
        } else if average < 60.0 {
            flags.push("Moderate data consistency issues - some cleanup recommended".to_string());
        }
    }

    tracing::info!("Found {} red flags", flags.len());
    RedFlagReport { flags, has_macros }
}

fn sheet_flags(profiles: &[SheetProfile], total_sheets: usize) -> Vec<String> {
    let mut flags = Vec::new();
    let mut total_merged = 0usize;
    let mut protected_sheets = 0usize;
    let mut formula_heavy_sheets = 0usize;

    for profile in profiles {
        if !profile.scan_complete {
            let reason = profile
                .analysis_errors
                .first()
                .map(String::as_str)
                .unwrap_or("sheet could not be read");
            flags.push(format!(
                "Analysis error in sheet '{}': {}",
                profile.sheet_name, reason
            ));
            continue;
        }

        total_merged += profile.merged_cells;
        if profile.merged_cells > 50 {
            flags.push(format!(
                "Sheet '{}' has excessive merged cells ({})",
                profile.sheet_name, profile.merged_cells
            ));
        }

        if profile.protected {
            protected_sheets += 1;
        }

        if profile.used_cells > 0 && profile.total_cells > 1000 {
            let density = profile.used_cells as f64 / profile.total_cells as f64;
            if density < 0.05 {
                flags.push(format!(
                    "Sheet '{}' has very sparse data (low density)",
                    profile.sheet_name
                ));
            }
        }

        if profile.used_cells > 100 {
            let formula_ratio = profile.formula_cells as f64 / profile.used_cells as f64;
            if formula_ratio > 0.7 {
                formula_heavy_sheets += 1;
            }
        }
    }

    if total_merged > 20 {
        flags.push(format!(
            "High total merged cells across file ({}) - major automation blocker",
            total_merged
        ));
    } else if total_merged > 10 {
        flags.push(format!(
            "Moderate merged cell usage ({}) - complicates automation",
            total_merged
        ));
    }

    if protected_sheets > 0 {
        flags.push(format!(
            "Protected sheets detected ({}) - may restrict automation access",
            protected_sheets
        ));
    }

    if formula_heavy_sheets as f64 > total_sheets as f64 * 0.5 {
        flags.push("Many sheets are formula-heavy - complex logic replication required".to_string());
    }

    flags
}

/// Mean consistency over the first sheets; an unreadable sheet scores 0.
pub fn consistency_average(profiles: &[SheetProfile]) -> Option<f64> {
    let scores: Vec<f64> = profiles
        .iter()
        .take(CONSISTENCY_SAMPLE_SHEETS)
        .map(|p| if p.scan_complete { consistency_score(p) } else { 0.0 })
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}
