use crate::models::{SheetTypeCounts, StructureReport, WorkbookSnapshot};
use crate::services::excel::utils::{bytes_to_mb, round_to};
use crate::services::excel::SheetVisibility;

const BASE_SCORE: i32 = 70;

/// Scores workbook-level organisation: sheet count, named ranges, hidden
/// sheets and file size.
pub fn analyze(snapshot: &WorkbookSnapshot) -> StructureReport {
    tracing::info!("Analyzing file structure...");

    let mut sheet_types = SheetTypeCounts::default();
    for visibility in &snapshot.visibility {
        match visibility {
            SheetVisibility::Visible => sheet_types.visible += 1,
            SheetVisibility::Hidden => sheet_types.hidden += 1,
            SheetVisibility::VeryHidden => sheet_types.very_hidden += 1,
        }
    }

    let mut report = StructureReport {
        total_sheets: snapshot.sheet_names.len(),
        sheet_types,
        named_ranges: snapshot.named_ranges,
        has_hidden_sheets: sheet_types.hidden > 0,
        has_very_hidden_sheets: sheet_types.very_hidden > 0,
        file_size_mb: round_to(bytes_to_mb(snapshot.file_size_bytes), 2),
        structure_score: 0,
    };
    report.structure_score = score(&report);

    tracing::info!("Structure analysis complete. Score: {}/100", report.structure_score);
    report
}

fn score(report: &StructureReport) -> u8 {
    let mut score = BASE_SCORE;

    score += match report.total_sheets {
        1..=10 => 15,
        11..=20 => 5,
        21..=30 => 0,
        0 => 0,
        _ => -20,
    };

    score += match report.named_ranges {
        0 => 0,
        1..=10 => 15,
        _ => 5,
    };

    if report.has_hidden_sheets {
        score -= 5;
    }
    if report.has_very_hidden_sheets {
        score -= 10;
    }

    if report.file_size_mb < 5.0 {
        score += 5;
    } else if report.file_size_mb > 50.0 {
        score -= 15;
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sheets: usize, named_ranges: usize, size_mb: u64) -> WorkbookSnapshot {
        WorkbookSnapshot {
            sheet_names: (0..sheets).map(|i| format!("Sheet{}", i)).collect(),
            visibility: vec![SheetVisibility::Visible; sheets],
            named_ranges,
            file_size_bytes: size_mb * 1024 * 1024,
            ..WorkbookSnapshot::default()
        }
    }

    #[test]
    fn small_tidy_workbook() {
        let report = analyze(&snapshot(1, 0, 0));
        assert_eq!(report.structure_score, 90);
        assert_eq!(report.sheet_types.visible, 1);
    }

    #[test]
    fn named_ranges_reach_the_ceiling() {
        assert_eq!(analyze(&snapshot(3, 4, 0)).structure_score, 100);
        assert_eq!(analyze(&snapshot(3, 40, 0)).structure_score, 95);
    }

    #[test]
    fn sheet_count_bands() {
        assert_eq!(analyze(&snapshot(15, 0, 10)).structure_score, 75);
        assert_eq!(analyze(&snapshot(25, 0, 10)).structure_score, 70);
        assert_eq!(analyze(&snapshot(31, 0, 10)).structure_score, 50);
    }

    #[test]
    fn hidden_sheets_and_size_penalties_stack() {
        let mut snap = snapshot(3, 0, 60);
        snap.visibility = vec![
            SheetVisibility::Visible,
            SheetVisibility::Hidden,
            SheetVisibility::VeryHidden,
        ];
        let report = analyze(&snap);
        assert!(report.has_hidden_sheets && report.has_very_hidden_sheets);
        // 70 + 15 - 5 - 10 - 15
        assert_eq!(report.structure_score, 55);
        assert_eq!(report.file_size_mb, 60.0);
    }

    #[test]
    fn score_never_leaves_bounds() {
        let mut snap = snapshot(60, 0, 500);
        snap.visibility = vec![SheetVisibility::VeryHidden; 60];
        // 70 - 20 - 10 - 15
        assert_eq!(analyze(&snap).structure_score, 25);
    }
}
