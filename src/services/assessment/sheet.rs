use std::collections::BTreeMap;

use crate::config::{AnalysisConfig, MAX_CELL_ERRORS, MAX_HEADER_LEN};
use crate::models::SheetProfile;
use crate::services::excel::utils::truncate_chars;
use crate::services::excel::WorkbookView;

/// Function tags in priority order; a formula gets the first one it contains.
const FUNCTION_TAGS: [&str; 9] = [
    "SUM", "AVERAGE", "COUNT", "IF", "VLOOKUP", "INDEX", "MATCH", "INDIRECT", "OFFSET",
];

/// Scans one sheet row-major and builds its content profile.
///
/// Per-cell failures are recorded (up to [`MAX_CELL_ERRORS`]) and skipped. A
/// sheet whose extent cannot be read yields an empty profile with
/// `scan_complete == false`.
pub fn analyze<W: WorkbookView + ?Sized>(view: &W, sheet_name: &str, config: &AnalysisConfig) -> SheetProfile {
    tracing::debug!("Analyzing sheet: {}", sheet_name);
    let mut profile = SheetProfile {
        sheet_name: sheet_name.to_string(),
        ..SheetProfile::default()
    };

    let (rows, cols) = match view.sheet_dimensions(sheet_name) {
        Ok(dims) => dims,
        Err(e) => {
            tracing::error!("Critical error analyzing sheet '{}': {}", sheet_name, e);
            profile.analysis_errors.push(format!("Dimension analysis failed: {}", e));
            return profile;
        }
    };
    profile.dimensions = (rows, cols);
    profile.total_cells = rows.saturating_mul(cols);
    profile.rows_scanned = rows.min(config.max_rows_per_sheet);
    if rows > config.max_rows_per_sheet {
        tracing::warn!(
            "Large sheet '{}' detected. Analyzing first {} rows only",
            sheet_name,
            config.max_rows_per_sheet
        );
    }

    match view.merged_range_count(sheet_name) {
        Ok(count) => profile.merged_cells = count,
        Err(e) => profile.analysis_errors.push(format!("Merged cells analysis failed: {}", e)),
    }
    match view.is_protected(sheet_name) {
        Ok(protected) => profile.protected = protected,
        Err(e) => profile.analysis_errors.push(format!("Sheet protection analysis failed: {}", e)),
    }

    scan_cells(view, &mut profile, cols, config);

    match view.has_table(sheet_name) {
        Ok(present) => profile.has_tables = present,
        Err(e) => profile.analysis_errors.push(format!("Table detection failed: {}", e)),
    }

    if rows > 0 {
        detect_headers(view, &mut profile, cols, config);
    }

    profile.scan_complete = true;
    tracing::debug!(
        "Sheet '{}' analysis complete. Used cells: {}, Formulas: {}",
        sheet_name,
        profile.used_cells,
        profile.formula_cells
    );
    profile
}

fn scan_cells<W: WorkbookView + ?Sized>(
    view: &W,
    profile: &mut SheetProfile,
    cols: usize,
    config: &AnalysisConfig,
) {
    let mut formula_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut validated_cells = 0usize;

    for row in 0..profile.rows_scanned {
        for col in 0..cols {
            let text = match view.cell_value(&profile.sheet_name, row, col) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    if profile.analysis_errors.len() < MAX_CELL_ERRORS {
                        profile
                            .analysis_errors
                            .push(format!("Cell analysis error at {},{}: {}", row + 1, col + 1, e));
                    }
                    continue;
                }
            };

            profile.used_cells += 1;
            if view.is_formula(&text) {
                profile.formula_cells += 1;
                profile
                    .formulas
                    .push(truncate_chars(&text, config.max_formula_sample_len));
                if let Some(tag) = function_tag(&text) {
                    *formula_types.entry(tag.to_string()).or_insert(0) += 1;
                }
            }
            if view.has_validation(&profile.sheet_name, row, col) {
                validated_cells += 1;
            }
        }
    }

    profile.formula_types = formula_types;
    profile.has_data_validation = validated_cells > 0;
}

fn detect_headers<W: WorkbookView + ?Sized>(
    view: &W,
    profile: &mut SheetProfile,
    cols: usize,
    config: &AnalysisConfig,
) {
    let mut headers = Vec::new();
    for col in 0..cols {
        if headers.len() >= config.max_header_samples {
            break;
        }
        match view.cell_value(&profile.sheet_name, 0, col) {
            Ok(Some(text)) => headers.push(truncate_chars(&text, MAX_HEADER_LEN)),
            Ok(None) => {}
            Err(e) => {
                profile.analysis_errors.push(format!("Header detection failed: {}", e));
                break;
            }
        }
    }
    profile.headers_detected = headers;
}

/// First function tag found in the formula, case-insensitively.
pub fn function_tag(formula: &str) -> Option<&'static str> {
    let upper = formula.to_uppercase();
    FUNCTION_TAGS.iter().copied().find(|tag| upper.contains(tag))
}

/// Structural-quality score of a sheet in `[0, 100]`.
pub fn consistency_score(profile: &SheetProfile) -> f64 {
    let mut score = 70.0;

    if profile.has_tables {
        score += 20.0;
    }
    if profile.has_data_validation {
        score += 15.0;
    }
    if !profile.headers_detected.is_empty() {
        score += 10.0;
    }

    let used_cells = profile.used_cells.max(1) as f64;

    if profile.merged_cells > 0 {
        let merged_ratio = profile.merged_cells as f64 / used_cells;
        score -= if merged_ratio > 0.2 {
            30.0
        } else if merged_ratio > 0.1 {
            15.0
        } else {
            5.0
        };
    }

    let total_cells = profile.total_cells.max(1);
    if total_cells > 100 {
        let density = used_cells / total_cells as f64;
        if density < 0.05 {
            score -= 20.0;
        } else if density < 0.1 {
            score -= 10.0;
        }
    }

    if profile.used_cells > 10 {
        let formula_ratio = profile.formula_cells as f64 / used_cells;
        if formula_ratio > 0.8 {
            score -= 10.0;
        } else if (0.1..=0.5).contains(&formula_ratio) {
            score += 5.0;
        }
    }

    f64::clamp(score, 0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::{InMemorySheet, InMemoryWorkbook, ViewError};
    use pretty_assertions::assert_eq;

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn workbook(sheet: InMemorySheet) -> InMemoryWorkbook {
        InMemoryWorkbook::new("book.xlsx").with_sheet(sheet)
    }

    #[test]
    fn profiles_cells_formulas_and_headers() {
        let wb = workbook(
            InMemorySheet::new("Sales")
                .row(0, &["Region", "Q1", "Q2", "Total"])
                .row(1, &["North", "10", "12", "=SUM(B2:C2)"])
                .row(2, &["South", "8", "9", "=IF(B3>C3,B3,C3)"])
                .merged_ranges(1),
        );
        let profile = analyze(&wb, "Sales", &config());

        assert!(profile.scan_complete);
        assert_eq!(profile.dimensions, (3, 4));
        assert_eq!(profile.total_cells, 12);
        assert_eq!(profile.used_cells, 12);
        assert_eq!(profile.formula_cells, 2);
        assert_eq!(profile.merged_cells, 1);
        assert_eq!(profile.headers_detected, vec!["Region", "Q1", "Q2", "Total"]);
        assert_eq!(profile.formula_types.get("SUM"), Some(&1));
        assert_eq!(profile.formula_types.get("IF"), Some(&1));
        assert!(profile.analysis_errors.is_empty());
    }

    #[test]
    fn first_matching_tag_wins() {
        assert_eq!(function_tag("=SUMIF(A:A,\"x\",B:B)"), Some("SUM"));
        assert_eq!(function_tag("=vlookup(A1,B:C,2,0)"), Some("VLOOKUP"));
        assert_eq!(function_tag("=INDEX(A:A,MATCH(1,B:B,0))"), Some("INDEX"));
        assert_eq!(function_tag("=A1*2"), None);
    }

    #[test]
    fn rows_beyond_the_cap_are_not_scanned() {
        let mut sheet = InMemorySheet::new("Log");
        for row in 0..50 {
            sheet.set_cell(row, 0, format!("entry {}", row));
        }
        let wb = workbook(sheet);
        let config = AnalysisConfig {
            max_rows_per_sheet: 20,
            ..AnalysisConfig::default()
        };
        let profile = analyze(&wb, "Log", &config);
        assert_eq!(profile.dimensions, (50, 1));
        assert_eq!(profile.rows_scanned, 20);
        assert_eq!(profile.used_cells, 20);
    }

    #[test]
    fn samples_are_truncated() {
        let long_formula = format!("=SUM({})", "A1,".repeat(100));
        let long_header = "H".repeat(80);
        let wb = workbook(
            InMemorySheet::new("S")
                .cell(0, 0, long_header)
                .cell(1, 0, long_formula),
        );
        let config = AnalysisConfig {
            max_formula_sample_len: 10,
            ..AnalysisConfig::default()
        };
        let profile = analyze(&wb, "S", &config);
        assert_eq!(profile.formulas, vec!["=SUM(A1,A1"]);
        assert_eq!(profile.headers_detected[0].chars().count(), MAX_HEADER_LEN);
    }

    #[test]
    fn header_count_is_bounded() {
        let headers: Vec<String> = (0..30).map(|i| format!("Col{}", i)).collect();
        let wb = workbook(InMemorySheet::new("Wide").row(0, &headers));
        let profile = analyze(&wb, "Wide", &config());
        assert_eq!(profile.headers_detected.len(), 20);
    }

    #[test]
    fn validation_metadata_sets_the_flag() {
        let wb = workbook(InMemorySheet::new("Form").cell(0, 0, "Status").cell(1, 0, "Open").validation(1, 0));
        assert!(analyze(&wb, "Form", &config()).has_data_validation);
    }

    #[test]
    fn unreadable_sheet_yields_an_incomplete_profile() {
        let wb = workbook(InMemorySheet::new("Broken").unreadable("bad xml"));
        let profile = analyze(&wb, "Broken", &config());
        assert!(!profile.scan_complete);
        assert_eq!(profile.used_cells, 0);
        assert_eq!(profile.analysis_errors.len(), 1);
        assert!(profile.analysis_errors[0].starts_with("Dimension analysis failed"));
    }

    struct FlakyCells(InMemoryWorkbook);

    impl WorkbookView for FlakyCells {
        fn sheet_names(&self) -> Vec<String> {
            self.0.sheet_names()
        }
        fn sheet_dimensions(&self, name: &str) -> Result<(usize, usize), ViewError> {
            self.0.sheet_dimensions(name)
        }
        fn cell_value(&self, name: &str, row: usize, col: usize) -> Result<Option<String>, ViewError> {
            if col == 1 {
                return Err(ViewError::UnreadableCell {
                    row,
                    col,
                    reason: "shared string index out of range".to_string(),
                });
            }
            self.0.cell_value(name, row, col)
        }
        fn file_size_bytes(&self) -> u64 {
            0
        }
    }

    #[test]
    fn cell_errors_are_bounded_and_skipped() {
        let mut sheet = InMemorySheet::new("Data");
        for row in 0..12 {
            sheet.set_cell(row, 0, "x");
            sheet.set_cell(row, 1, "y");
        }
        let view = FlakyCells(workbook(sheet));
        let profile = analyze(&view, "Data", &config());

        assert!(profile.scan_complete);
        assert_eq!(profile.used_cells, 12);
        // Five cell errors plus the header read failing on column 1.
        assert_eq!(profile.analysis_errors.len(), MAX_CELL_ERRORS + 1);
        assert_eq!(profile.headers_detected, vec!["x"]);
    }

    fn profile_with(used: usize, formulas: usize, total: usize) -> SheetProfile {
        SheetProfile {
            used_cells: used,
            formula_cells: formulas,
            total_cells: total,
            scan_complete: true,
            ..SheetProfile::default()
        }
    }

    #[test]
    fn consistency_bonuses() {
        let mut profile = profile_with(0, 0, 0);
        assert_eq!(consistency_score(&profile), 70.0);
        profile.has_tables = true;
        profile.has_data_validation = true;
        profile.headers_detected = vec!["Id".to_string()];
        assert_eq!(consistency_score(&profile), 100.0);
    }

    #[test]
    fn merged_cell_penalties() {
        let mut profile = profile_with(100, 0, 100);
        profile.merged_cells = 25;
        assert_eq!(consistency_score(&profile), 40.0);
        profile.merged_cells = 15;
        assert_eq!(consistency_score(&profile), 55.0);
        profile.merged_cells = 5;
        assert_eq!(consistency_score(&profile), 65.0);
    }

    #[test]
    fn sparse_sheets_are_penalised() {
        assert_eq!(consistency_score(&profile_with(4, 0, 1000)), 50.0);
        assert_eq!(consistency_score(&profile_with(80, 0, 1000)), 60.0);
        assert_eq!(consistency_score(&profile_with(200, 0, 1000)), 70.0);
    }

    #[test]
    fn formula_ratio_adjustments() {
        assert_eq!(consistency_score(&profile_with(200, 190, 200)), 60.0);
        assert_eq!(consistency_score(&profile_with(200, 60, 200)), 75.0);
        assert_eq!(consistency_score(&profile_with(200, 140, 200)), 70.0);
        // Too little data to judge the ratio.
        assert_eq!(consistency_score(&profile_with(10, 10, 10)), 70.0);
    }

    #[test]
    fn consistency_floor_is_zero() {
        let mut profile = profile_with(20, 20, 1000);
        profile.merged_cells = 500;
        // 70 - 30 - 20 - 10
        assert_eq!(consistency_score(&profile), 10.0);
        assert!(consistency_score(&profile) >= 0.0);
    }
}
