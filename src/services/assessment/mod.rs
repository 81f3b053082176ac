//! The assessment pipeline.
//!
//! Stages run in a fixed order, each taking the outputs of earlier stages as
//! parameters: structure, per-sheet scan, formulas, patterns, red flags and
//! opportunities, aggregation, recommendations. A failing stage falls back to
//! its safe default and records a diagnostic; [`assess`] always returns an
//! [`Assessment`].

use std::borrow::Cow;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::config::{AnalysisConfig, CONSISTENCY_SAMPLE_SHEETS};
use crate::models::{
    Assessment, DetailedAnalysis, FeasibilityLevel, FileDetails, FileInfo, FormulaBreakdown,
    FormulaSummary, PatternBreakdown, PatternSummary, QualityMetrics, ScoreBreakdown, SheetProfile,
    SheetSummary, StructureReport, WorkbookSnapshot,
};
use crate::services::excel::utils::round_to;
use crate::services::excel::WorkbookView;

pub mod formula;
pub mod opportunities;
pub mod patterns;
pub mod recommend;
pub mod red_flags;
pub mod scoring;
pub mod sheet;
pub mod snapshot;
pub mod structure;

use recommend::RecommendationInputs;
use red_flags::{RedFlagReport, RiskInputs};
use scoring::{ScoreInputs, FALLBACK_SCORE};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A whole stage could not produce output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("none of the {attempted} scanned sheets could be read")]
    NoReadableSheets { attempted: usize },

    #[error("overall score is not a finite number ({value})")]
    NonFiniteScore { value: f64 },
}

/// Runs every stage over `view`, stamped with the current local time.
pub fn assess<W: WorkbookView + ?Sized>(view: &W, config: &AnalysisConfig) -> Assessment {
    assess_at(view, config, Local::now().naive_local())
}

/// Same as [`assess`] with a caller-supplied timestamp; the result depends on
/// nothing else outside `view` and `config`.
pub fn assess_at<W: WorkbookView + ?Sized>(
    view: &W,
    config: &AnalysisConfig,
    now: NaiveDateTime,
) -> Assessment {
    let snapshot = WorkbookSnapshot::capture(view);
    tracing::info!(
        "Starting Excel automation analysis: {} ({} sheets)",
        snapshot.display_name(),
        snapshot.sheet_names.len()
    );

    let mut analysis_errors = snapshot.capture_errors.clone();
    let mut warnings = Vec::new();
    if snapshot.sheet_names.is_empty() {
        tracing::warn!("Workbook exposes no sheets");
        analysis_errors.push("Workbook exposes no sheets".to_string());
    }

    let structure = structure::analyze(&snapshot);

    let profiles = scan_sheets(view, &snapshot, config, &mut warnings);
    for profile in &profiles {
        for error in &profile.analysis_errors {
            analysis_errors.push(format!("{}: {}", profile.sheet_name, error));
        }
    }

    let (formulas, formulas_complete) = match formula::analyze(&profiles) {
        Ok(summary) => (summary, !profiles.is_empty()),
        Err(e) => {
            tracing::error!("Formula analysis failed: {}", e);
            analysis_errors.push(format!("Formula analysis failed: {}", e));
            (FormulaSummary::assume_hard(), false)
        }
    };

    let patterns = patterns::detect(&snapshot.sheet_names);
    analysis_errors.extend(patterns.analysis_errors.iter().cloned());

    let consistency_sample = consistency_profiles(view, &snapshot, config, &profiles);
    let risks = red_flags::detect(RiskInputs {
        structure: &structure,
        formulas: &formulas,
        profiles: &profiles,
        consistency_sample: &consistency_sample,
        container_macros: snapshot.signals_macros(),
    });
    let opportunities = opportunities::identify(&structure, &formulas, &patterns);

    let (overall_score, feasibility_level) = match scoring::aggregate(ScoreInputs {
        structure_score: f64::from(structure.structure_score),
        formula_difficulty: f64::from(formulas.automation_difficulty_score),
        pattern_score: f64::from(patterns.pattern_score),
        red_flags: risks.flags.len(),
    }) {
        Ok(score) => (score, FeasibilityLevel::from_score(score)),
        Err(e) => {
            tracing::error!("Score calculation failed: {}", e);
            analysis_errors.push(format!("Score calculation failed: {}", e));
            (FALLBACK_SCORE, FeasibilityLevel::Unknown)
        }
    };

    let recommended_tools = recommend::recommend(&RecommendationInputs {
        overall_score,
        complexity_ratio: formulas.formula_complexity_ratio,
        file_size_mb: structure.file_size_mb,
        total_formulas: formulas.total_formulas,
        has_macros: risks.has_macros,
        has_patterns: patterns.pattern_score > 20,
        time_based: patterns.time_based_patterns,
        consolidation: patterns.consolidation_patterns,
        red_flags: risks.flags.len(),
    });

    let stages_complete = [
        !snapshot.sheet_names.is_empty() && snapshot.capture_errors.is_empty(),
        formulas_complete,
        !snapshot.sheet_names.is_empty() && patterns.analysis_errors.is_empty(),
        !profiles.is_empty() && profiles.iter().all(|p| p.scan_complete),
    ];
    let completed = stages_complete.iter().filter(|done| **done).count();
    let analysis_completeness = round_to(completed as f64 / stages_complete.len() as f64 * 100.0, 1);

    let detailed_analysis = DetailedAnalysis {
        file_info: file_details(&snapshot, &structure, &risks),
        formula_analysis: formula_breakdown(&formulas),
        pattern_analysis: pattern_breakdown(&patterns),
        scores: ScoreBreakdown {
            structure_score: f64::from(structure.structure_score),
            formula_difficulty_score: 100.0 - f64::from(formulas.automation_difficulty_score),
            pattern_score: f64::from(patterns.pattern_score.min(100)),
            overall_score,
        },
        quality_metrics: QualityMetrics {
            red_flags_count: risks.flags.len(),
            opportunities_count: opportunities.len(),
            analysis_completeness,
        },
        sheets: sheet_summaries(&snapshot, &profiles),
        analysis_errors,
        warnings,
    };

    tracing::info!(
        "Analysis complete: {} ({}), completeness {}%",
        overall_score,
        feasibility_level,
        analysis_completeness
    );

    Assessment {
        overall_score,
        feasibility_level,
        estimated_effort: feasibility_level.estimated_effort().to_string(),
        recommended_tools,
        red_flags: risks.flags,
        opportunities,
        detailed_analysis,
        analysis_timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        file_info: FileInfo {
            name: snapshot.display_name().to_string(),
            size_mb: structure.file_size_mb,
            sheets: structure.total_sheets,
        },
    }
}

/// Profiles the first `max_sheets` sheets once; later stages share the result.
fn scan_sheets<W: WorkbookView + ?Sized>(
    view: &W,
    snapshot: &WorkbookSnapshot,
    config: &AnalysisConfig,
    warnings: &mut Vec<String>,
) -> Vec<SheetProfile> {
    let total = snapshot.sheet_names.len();
    if total > config.max_sheets {
        tracing::warn!(
            "Large workbook with {} sheets. Analyzing first {} sheets only",
            total,
            config.max_sheets
        );
        warnings.push(format!(
            "Large workbook with {} sheets. Analyzing first {} sheets only",
            total, config.max_sheets
        ));
    }

    let profiles: Vec<SheetProfile> = snapshot
        .sheet_names
        .iter()
        .take(config.max_sheets)
        .map(|name| sheet::analyze(view, name, config))
        .collect();

    for profile in &profiles {
        if profile.rows_scanned < profile.dimensions.0 {
            warnings.push(format!(
                "Sheet '{}' has {} rows. Analyzed first {} rows only",
                profile.sheet_name, profile.dimensions.0, profile.rows_scanned
            ));
        }
    }
    profiles
}

/// Profiles of the first ten sheets for the consistency average. These come
/// from the main scan unless `max_sheets` stopped it short of ten.
fn consistency_profiles<'a, W: WorkbookView + ?Sized>(
    view: &W,
    snapshot: &WorkbookSnapshot,
    config: &AnalysisConfig,
    profiles: &'a [SheetProfile],
) -> Cow<'a, [SheetProfile]> {
    let wanted = snapshot.sheet_names.len().min(CONSISTENCY_SAMPLE_SHEETS);
    if profiles.len() >= wanted {
        return Cow::Borrowed(&profiles[..wanted]);
    }
    let mut sample = profiles.to_vec();
    sample.extend(
        snapshot.sheet_names[profiles.len()..wanted]
            .iter()
            .map(|name| sheet::analyze(view, name, config)),
    );
    Cow::Owned(sample)
}

fn file_details(
    snapshot: &WorkbookSnapshot,
    structure: &StructureReport,
    risks: &RedFlagReport,
) -> FileDetails {
    FileDetails {
        file_name: snapshot.display_name().to_string(),
        sheets: structure.total_sheets,
        file_size_mb: structure.file_size_mb,
        named_ranges: structure.named_ranges,
        has_hidden_sheets: structure.has_hidden_sheets,
        has_very_hidden_sheets: structure.has_very_hidden_sheets,
        has_macros: risks.has_macros,
    }
}

fn formula_breakdown(formulas: &FormulaSummary) -> FormulaBreakdown {
    FormulaBreakdown {
        total_formulas: formulas.total_formulas,
        complex_formulas: formulas.complex_formulas,
        simple_formulas: formulas.simple_formulas,
        complexity_ratio: formulas.formula_complexity_ratio,
        formula_types: formulas.formula_types_summary.clone(),
        most_complex_formulas: formulas.most_complex_formulas.clone(),
        difficulty_score: formulas.automation_difficulty_score,
    }
}

fn pattern_breakdown(patterns: &PatternSummary) -> PatternBreakdown {
    PatternBreakdown {
        time_based_patterns: patterns.time_based_patterns,
        repeated_structures: patterns.repeated_structures,
        consolidation_patterns: patterns.consolidation_patterns,
        sheet_roles: patterns.roles.clone(),
        detected_patterns: patterns.detected_patterns.clone(),
        business_indicators: patterns.business_process_indicators.clone(),
        pattern_score: patterns.pattern_score,
    }
}

fn sheet_summaries(snapshot: &WorkbookSnapshot, profiles: &[SheetProfile]) -> Vec<SheetSummary> {
    profiles
        .iter()
        .zip(snapshot.visibility.iter())
        .map(|(profile, visibility)| SheetSummary {
            name: profile.sheet_name.clone(),
            visibility: *visibility,
            dimensions: profile.dimensions,
            used_cells: profile.used_cells,
            formula_cells: profile.formula_cells,
            merged_cells: profile.merged_cells,
            protected: profile.protected,
            has_tables: profile.has_tables,
            consistency_score: if profile.scan_complete {
                sheet::consistency_score(profile)
            } else {
                0.0
            },
            headers_detected: profile.headers_detected.clone(),
        })
        .collect()
}
