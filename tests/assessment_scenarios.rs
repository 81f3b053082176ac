use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use sheet_automation::models::{FeasibilityLevel, SheetRole};
use sheet_automation::services::excel::{
    InMemorySheet, InMemoryWorkbook, SheetVisibility, ViewError, WorkbookView,
};
use sheet_automation::{assess, assess_at, AnalysisConfig};

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 15)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap()
}

fn single_sheet_workbook() -> InMemoryWorkbook {
    InMemoryWorkbook::new("ledger.xlsx").with_file_size(1024).with_sheet(
        InMemorySheet::new("Sheet1")
            .row(0, &["Name", "Amount"])
            .row(1, &["Rent", "1200"]),
    )
}

#[test]
fn tidy_single_sheet_workbook_is_medium() {
    let assessment = assess_at(&single_sheet_workbook(), &AnalysisConfig::default(), at());
    let scores = &assessment.detailed_analysis.scores;

    assert_eq!(scores.structure_score, 90.0);
    assert_eq!(scores.formula_difficulty_score, 80.0);
    assert_eq!(scores.pattern_score, 0.0);
    assert!(assessment.red_flags.is_empty());
    assert_eq!(assessment.overall_score, 59.0);
    assert_eq!(assessment.feasibility_level, FeasibilityLevel::Medium);
    assert_eq!(
        assessment.estimated_effort,
        "2-3 months development + 3 weeks testing"
    );
    assert_eq!(
        assessment
            .recommended_tools
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>(),
        vec![
            "⚠️ Python + pandas - Possible with formula logic replication effort",
            "⚠️ Power Platform - Possible with data restructuring",
            "✅ No-code platforms (Zapier, Microsoft Flow) - Quick implementation option",
        ]
    );
}

#[test]
fn monthly_inputs_are_a_consolidation_workflow() {
    let mut wb = InMemoryWorkbook::new("close.xlsx").with_file_size(40 * 1024);
    for name in ["Jan_Input", "Feb_Input", "Q1_Report", "Summary"] {
        wb.push_sheet(InMemorySheet::new(name).row(0, &["Account", "Value"]));
    }
    let assessment = assess_at(&wb, &AnalysisConfig::default(), at());
    let patterns = &assessment.detailed_analysis.pattern_analysis;

    assert!(patterns.time_based_patterns);
    assert!(patterns.consolidation_patterns);
    assert_eq!(patterns.sheet_roles.get(SheetRole::DataEntry), ["Jan_Input", "Feb_Input"]);
    assert_eq!(patterns.sheet_roles.get(SheetRole::Reporting), ["Q1_Report"]);
    assert_eq!(patterns.sheet_roles.get(SheetRole::Summary), ["Summary"]);
    assert!(assessment.detailed_analysis.scores.pattern_score >= 50.0);
    assert!(assessment
        .opportunities
        .contains(&"Data consolidation process has high ROI automation potential".to_string()));
}

#[test]
fn indirect_heavy_sheet_is_hard_and_inconsistent() {
    let mut sheet = InMemorySheet::new("Lookups");
    for col in 0..10 {
        sheet.set_cell(0, col, format!("Key {}", col));
    }
    for row in 1..20 {
        for col in 0..10 {
            sheet.set_cell(row, col, format!("=INDIRECT(\"Data!A{}\")", row * 10 + col));
        }
    }
    let wb = InMemoryWorkbook::new("lookups.xlsx").with_sheet(sheet);
    let assessment = assess_at(&wb, &AnalysisConfig::default(), at());
    let formulas = &assessment.detailed_analysis.formula_analysis;

    assert_eq!(formulas.total_formulas, 190);
    assert_eq!(formulas.complexity_ratio, 1.0);
    assert!(formulas.difficulty_score >= 85);
    assert_eq!(formulas.formula_types.get("INDIRECT"), Some(&190));

    let sheet = &assessment.detailed_analysis.sheets[0];
    assert_eq!(sheet.used_cells, 200);
    // 70 + 10 for headers - 10 for a formula ratio above 0.8
    assert_eq!(sheet.consistency_score, 70.0);
    assert!(assessment
        .red_flags
        .contains(&"Very high complex formula ratio (>70%) - significant logic replication required".to_string()));
}

#[test]
fn identical_views_give_identical_assessments() {
    let wb = single_sheet_workbook();
    let first = assess_at(&wb, &AnalysisConfig::default(), at());
    let second = assess_at(&wb, &AnalysisConfig::default(), at());
    assert_eq!(first, second);

    let mut live = assess(&wb, &AnalysisConfig::default());
    live.analysis_timestamp = first.analysis_timestamp.clone();
    assert_eq!(live, first);
}

#[test]
fn hidden_macro_workbook_collects_flags() {
    let wb = InMemoryWorkbook::new("ops.xlsm")
        .with_file_size(1024)
        .with_macro_archive(true)
        .with_sheet(InMemorySheet::new("Input").row(0, &["a"]))
        .with_sheet(
            InMemorySheet::new("Engine")
                .visibility(SheetVisibility::VeryHidden)
                .row(0, &["b"]),
        );
    let assessment = assess_at(&wb, &AnalysisConfig::default(), at());

    assert!(assessment.detailed_analysis.file_info.has_macros);
    assert!(assessment.detailed_analysis.file_info.has_very_hidden_sheets);
    assert_eq!(
        assessment.red_flags,
        vec![
            "Very hidden sheets detected - likely contains sensitive or complex logic",
            "VBA macros detected - requires specialized automation approach",
        ]
    );
    assert!(assessment
        .recommended_tools
        .iter()
        .any(|r| r.tool == "Enhanced VBA/Excel Macros"));
}

/// Every capability fails.
struct BrokenView;

impl WorkbookView for BrokenView {
    fn sheet_names(&self) -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }
    fn sheet_dimensions(&self, name: &str) -> Result<(usize, usize), ViewError> {
        Err(ViewError::UnreadableSheet {
            sheet: name.to_string(),
            reason: "corrupt".to_string(),
        })
    }
    fn cell_value(&self, _name: &str, row: usize, col: usize) -> Result<Option<String>, ViewError> {
        Err(ViewError::UnreadableCell {
            row,
            col,
            reason: "corrupt".to_string(),
        })
    }
    fn named_range_count(&self) -> Result<usize, ViewError> {
        Err(ViewError::Unavailable {
            capability: "defined names",
            reason: "corrupt".to_string(),
        })
    }
    fn file_size_bytes(&self) -> u64 {
        0
    }
}

#[test]
fn failing_view_still_yields_an_assessment() {
    let assessment = assess_at(&BrokenView, &AnalysisConfig::default(), at());
    let details = &assessment.detailed_analysis;

    assert!((0.0..=100.0).contains(&assessment.overall_score));
    assert_eq!(details.formula_analysis.difficulty_score, 100);
    assert_eq!(details.quality_metrics.analysis_completeness, 25.0);
    assert_eq!(assessment.file_info.name, "Unknown");
    assert!(details
        .analysis_errors
        .iter()
        .any(|e| e.starts_with("Named ranges analysis failed")));
    assert_eq!(
        assessment
            .red_flags
            .iter()
            .filter(|f| f.starts_with("Analysis error in sheet"))
            .count(),
        3
    );
}

#[test]
fn assessment_serializes_with_stable_field_names() {
    let assessment = assess_at(&single_sheet_workbook(), &AnalysisConfig::default(), at());
    let json = serde_json::to_value(&assessment).unwrap();

    assert_eq!(json["overall_score"], 59.0);
    assert_eq!(
        json["feasibility_level"],
        "MEDIUM - Good automation potential with preparation"
    );
    assert_eq!(json["analysis_timestamp"], "2025-01-15 08:00:00");
    assert_eq!(json["file_info"]["name"], "ledger.xlsx");
    assert_eq!(json["detailed_analysis"]["scores"]["formula_difficulty_score"], 80.0);
    assert_eq!(
        json["detailed_analysis"]["pattern_analysis"]["sheet_roles"]["data_entry"][0],
        "Sheet1"
    );
    assert!(json["red_flags"].as_array().unwrap().is_empty());
}

fn arb_workbook() -> impl Strategy<Value = InMemoryWorkbook> {
    let cell = prop_oneof![
        "[a-z]{1,6}",
        "=[A-Z]{2,8}\\([A-C][1-9]\\)",
        "[0-9]{1,4}",
    ];
    let sheet = (
        "[A-Za-z_ 0-9]{1,12}",
        proptest::collection::vec(((0usize..30), (0usize..8), cell), 0..40),
        0usize..80,
        any::<bool>(),
    );
    (
        proptest::collection::vec(sheet, 1..8),
        0u64..(300 * 1024 * 1024),
        0usize..20,
    )
        .prop_map(|(sheets, size, named)| {
            let mut wb = InMemoryWorkbook::new("generated.xlsx")
                .with_file_size(size)
                .with_named_ranges(named);
            for (name, cells, merged, protected) in sheets {
                let mut sheet = InMemorySheet::new(name).merged_ranges(merged).protected(protected);
                for (row, col, text) in cells {
                    sheet.set_cell(row, col, text);
                }
                wb.push_sheet(sheet);
            }
            wb
        })
}

proptest! {
    #[test]
    fn every_score_stays_in_bounds(wb in arb_workbook()) {
        let assessment = assess_at(&wb, &AnalysisConfig::default(), at());
        let scores = &assessment.detailed_analysis.scores;
        for score in [
            assessment.overall_score,
            scores.structure_score,
            scores.formula_difficulty_score,
            scores.pattern_score,
            assessment.detailed_analysis.quality_metrics.analysis_completeness,
        ] {
            prop_assert!((0.0..=100.0).contains(&score));
        }
        for sheet in &assessment.detailed_analysis.sheets {
            prop_assert!((0.0..=100.0).contains(&sheet.consistency_score));
        }
    }

    #[test]
    fn tier_round_trips_through_the_score_block(wb in arb_workbook()) {
        let assessment = assess_at(&wb, &AnalysisConfig::default(), at());
        prop_assert_eq!(
            FeasibilityLevel::from_score(assessment.detailed_analysis.scores.overall_score),
            assessment.feasibility_level
        );
    }

    #[test]
    fn formulas_split_into_complex_and_simple(wb in arb_workbook()) {
        let assessment = assess_at(&wb, &AnalysisConfig::default(), at());
        let formulas = &assessment.detailed_analysis.formula_analysis;
        prop_assert_eq!(
            formulas.complex_formulas + formulas.simple_formulas,
            formulas.total_formulas
        );
    }
}
