//! Records passed between assessment stages, and the final [`Assessment`].
//!
//! Every list defaults to empty and every score is kept within `[0, 100]`
//! unless a field says otherwise.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::services::excel::SheetVisibility;

/// Workbook-level facts captured once at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkbookSnapshot {
    pub file_name: Option<String>,
    pub sheet_names: Vec<String>,
    pub visibility: Vec<SheetVisibility>,
    pub named_ranges: usize,
    pub file_size_bytes: u64,
    pub has_macro_archive: bool,
    pub capture_errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTypeCounts {
    pub visible: usize,
    pub hidden: usize,
    pub very_hidden: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureReport {
    pub total_sheets: usize,
    pub sheet_types: SheetTypeCounts,
    pub named_ranges: usize,
    pub has_hidden_sheets: bool,
    pub has_very_hidden_sheets: bool,
    pub file_size_mb: f64,
    pub structure_score: u8,
}

/// Content profile of one scanned sheet. Never mutated after the scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetProfile {
    pub sheet_name: String,
    pub dimensions: (usize, usize),
    pub total_cells: usize,
    pub rows_scanned: usize,
    pub used_cells: usize,
    pub formula_cells: usize,
    pub merged_cells: usize,
    pub protected: bool,
    pub has_tables: bool,
    pub has_data_validation: bool,
    pub formulas: Vec<String>,
    pub formula_types: BTreeMap<String, usize>,
    pub headers_detected: Vec<String>,
    pub analysis_errors: Vec<String>,
    /// False when the sheet could not be read at all.
    pub scan_complete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormulaSummary {
    pub total_formulas: usize,
    pub complex_formulas: usize,
    pub simple_formulas: usize,
    pub formula_complexity_ratio: f64,
    pub formula_types_summary: BTreeMap<String, usize>,
    pub most_complex_formulas: Vec<String>,
    pub automation_difficulty_score: u8,
    pub sheets_analyzed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetRole {
    DataEntry,
    Calculation,
    Reporting,
    Template,
    Summary,
}

impl SheetRole {
    pub const ALL: [SheetRole; 5] = [
        SheetRole::DataEntry,
        SheetRole::Calculation,
        SheetRole::Reporting,
        SheetRole::Template,
        SheetRole::Summary,
    ];
}

/// Sheets grouped by business-process role. A sheet appears under one role at most.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetRoles {
    pub data_entry: Vec<String>,
    pub calculation: Vec<String>,
    pub reporting: Vec<String>,
    pub template: Vec<String>,
    pub summary: Vec<String>,
}

impl SheetRoles {
    pub fn get(&self, role: SheetRole) -> &[String] {
        match role {
            SheetRole::DataEntry => &self.data_entry,
            SheetRole::Calculation => &self.calculation,
            SheetRole::Reporting => &self.reporting,
            SheetRole::Template => &self.template,
            SheetRole::Summary => &self.summary,
        }
    }

    pub fn push(&mut self, role: SheetRole, sheet: String) {
        let bucket = match role {
            SheetRole::DataEntry => &mut self.data_entry,
            SheetRole::Calculation => &mut self.calculation,
            SheetRole::Reporting => &mut self.reporting,
            SheetRole::Template => &mut self.template,
            SheetRole::Summary => &mut self.summary,
        };
        bucket.push(sheet);
    }

    pub fn role_of(&self, sheet: &str) -> Option<SheetRole> {
        SheetRole::ALL
            .into_iter()
            .find(|role| self.get(*role).iter().any(|s| s == sheet))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternSummary {
    pub time_based_patterns: bool,
    pub repeated_structures: bool,
    pub consolidation_patterns: bool,
    pub roles: SheetRoles,
    pub detected_patterns: Vec<String>,
    pub business_process_indicators: Vec<String>,
    /// Accumulated additively; may exceed 100 until the overall score is clamped.
    pub pattern_score: u32,
    pub analysis_errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeasibilityLevel {
    High,
    MediumHigh,
    Medium,
    LowMedium,
    Low,
    /// Aggregation failed; the score is a conservative placeholder.
    Unknown,
}

impl FeasibilityLevel {
    /// Maps an overall score to its tier. Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => FeasibilityLevel::High,
            s if s >= 65.0 => FeasibilityLevel::MediumHigh,
            s if s >= 50.0 => FeasibilityLevel::Medium,
            s if s >= 35.0 => FeasibilityLevel::LowMedium,
            _ => FeasibilityLevel::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeasibilityLevel::High => "HIGH - Excellent automation candidate",
            FeasibilityLevel::MediumHigh => "MEDIUM-HIGH - Very good automation potential",
            FeasibilityLevel::Medium => "MEDIUM - Good automation potential with preparation",
            FeasibilityLevel::LowMedium => "LOW-MEDIUM - Possible but requires significant restructuring",
            FeasibilityLevel::Low => "LOW - Not recommended for automation in current state",
            FeasibilityLevel::Unknown => "UNKNOWN - Analysis incomplete",
        }
    }

    pub fn estimated_effort(self) -> &'static str {
        match self {
            FeasibilityLevel::High => "2-4 weeks development + 1 week testing",
            FeasibilityLevel::MediumHigh => "1-2 months development + 2 weeks testing",
            FeasibilityLevel::Medium => "2-3 months development + 3 weeks testing",
            FeasibilityLevel::LowMedium => "3-4 months development + 1 month testing",
            FeasibilityLevel::Low => "6+ months or complete redesign recommended",
            FeasibilityLevel::Unknown => "Manual assessment required",
        }
    }
}

impl fmt::Display for FeasibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for FeasibilityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Success,
    Caution,
}

impl Marker {
    pub fn symbol(self) -> &'static str {
        match self {
            Marker::Success => "✅",
            Marker::Caution => "⚠️",
        }
    }
}

/// One recommended automation approach with its rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub marker: Marker,
    pub tool: &'static str,
    pub rationale: &'static str,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - {}", self.marker.symbol(), self.tool, self.rationale)
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size_mb: f64,
    pub sheets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDetails {
    pub file_name: String,
    pub sheets: usize,
    pub file_size_mb: f64,
    pub named_ranges: usize,
    pub has_hidden_sheets: bool,
    pub has_very_hidden_sheets: bool,
    pub has_macros: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormulaBreakdown {
    pub total_formulas: usize,
    pub complex_formulas: usize,
    pub simple_formulas: usize,
    pub complexity_ratio: f64,
    pub formula_types: BTreeMap<String, usize>,
    pub most_complex_formulas: Vec<String>,
    pub difficulty_score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternBreakdown {
    pub time_based_patterns: bool,
    pub repeated_structures: bool,
    pub consolidation_patterns: bool,
    pub sheet_roles: SheetRoles,
    pub detected_patterns: Vec<String>,
    pub business_indicators: Vec<String>,
    /// Score as accumulated by the detector; may exceed 100.
    pub pattern_score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub structure_score: f64,
    /// `100 - automation difficulty`: higher means easier.
    pub formula_difficulty_score: f64,
    /// Pattern score clamped to 100 for display. The raw value is in
    /// `PatternBreakdown::pattern_score`.
    pub pattern_score: f64,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub red_flags_count: usize,
    pub opportunities_count: usize,
    pub analysis_completeness: f64,
}

/// Per-sheet aggregates reported alongside the workbook scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub visibility: SheetVisibility,
    pub dimensions: (usize, usize),
    pub used_cells: usize,
    pub formula_cells: usize,
    pub merged_cells: usize,
    pub protected: bool,
    pub has_tables: bool,
    pub consistency_score: f64,
    pub headers_detected: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailedAnalysis {
    pub file_info: FileDetails,
    pub formula_analysis: FormulaBreakdown,
    pub pattern_analysis: PatternBreakdown,
    pub scores: ScoreBreakdown,
    pub quality_metrics: QualityMetrics,
    pub sheets: Vec<SheetSummary>,
    pub analysis_errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// The single artifact produced by an assessment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub overall_score: f64,
    pub feasibility_level: FeasibilityLevel,
    pub estimated_effort: String,
    pub recommended_tools: Vec<Recommendation>,
    pub red_flags: Vec<String>,
    pub opportunities: Vec<String>,
    pub detailed_analysis: DetailedAnalysis,
    pub analysis_timestamp: String,
    pub file_info: FileInfo,
}
