use super::StageError;
use crate::services::excel::utils::round_to;

/// Score reported when the inputs cannot be combined.
pub const FALLBACK_SCORE: f64 = 25.0;

const STRUCTURE_WEIGHT: f64 = 0.3;
const FORMULA_WEIGHT: f64 = 0.4;
const PATTERN_WEIGHT: f64 = 0.3;

const PENALTY_PER_FLAG: f64 = 8.0;
const MAX_PENALTY: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub structure_score: f64,
    /// Automation difficulty; inverted before weighting.
    pub formula_difficulty: f64,
    /// Raw, possibly above 100.
    pub pattern_score: f64,
    pub red_flags: usize,
}

pub fn red_flag_penalty(red_flags: usize) -> f64 {
    (PENALTY_PER_FLAG * red_flags as f64).min(MAX_PENALTY)
}

/// Weighted blend of the stage scores less the red-flag penalty, clamped to
/// `[0, 100]` and rounded to one decimal.
pub fn aggregate(inputs: ScoreInputs) -> Result<f64, StageError> {
    tracing::info!("Calculating overall automation score...");

    let weighted = inputs.structure_score * STRUCTURE_WEIGHT
        + (100.0 - inputs.formula_difficulty) * FORMULA_WEIGHT
        + inputs.pattern_score * PATTERN_WEIGHT;
    if !weighted.is_finite() {
        return Err(StageError::NonFiniteScore { value: weighted });
    }

    let penalized = (weighted - red_flag_penalty(inputs.red_flags)).max(0.0);
    let overall = round_to(penalized.clamp(0.0, 100.0), 1);

    tracing::info!("Overall automation score: {}/100", overall);
    Ok(overall)
}
