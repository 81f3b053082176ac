use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::models::Assessment;

const RULE_WIDTH: usize = 80;
const SECTION_WIDTH: usize = 50;
const TOP_FUNCTIONS: usize = 5;

/// Renders an assessment as the plain-text feasibility report.
pub fn render_text(assessment: &Assessment) -> String {
    TextReport(assessment).to_string()
}

/// `Excel_Automation_Report_<stem>_<YYYYmmdd_HHMMSS>.txt`
pub fn default_report_name(file_name: &str, now: NaiveDateTime) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Excel_Automation_Report_{}_{}.txt",
        stem,
        now.format("%Y%m%d_%H%M%S")
    )
}

struct TextReport<'a>(&'a Assessment);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        let details = &a.detailed_analysis;

        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "📋 EXCEL AUTOMATION FEASIBILITY REPORT")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "File: {}", a.file_info.name)?;
        writeln!(f, "Analysis Date: {}", a.analysis_timestamp)?;
        writeln!(f, "File Size: {:.2} MB", a.file_info.size_mb)?;
        writeln!(f, "Sheets: {}", a.file_info.sheets)?;

        section(f, "🎯 OVERALL ASSESSMENT")?;
        writeln!(f, "Automation Score: {}/100", a.overall_score)?;
        let marker = if a.overall_score >= 80.0 {
            "✅"
        } else if a.overall_score >= 50.0 {
            "⚠️ "
        } else {
            "❌"
        };
        writeln!(f, "Feasibility Level: {} {}", marker, a.feasibility_level)?;
        writeln!(f, "Estimated Effort: {}", a.estimated_effort)?;

        section(f, "📈 DETAILED SCORES")?;
        let scores = &details.scores;
        writeln!(f, "• File Structure Score: {}/100", scores.structure_score)?;
        writeln!(f, "• Formula Complexity Score: {}/100", scores.formula_difficulty_score)?;
        writeln!(f, "• Automation Pattern Score: {}/100", scores.pattern_score)?;

        section(f, "🔧 TECHNICAL ANALYSIS")?;
        let formulas = &details.formula_analysis;
        writeln!(f, "• Total Formulas: {}", thousands(formulas.total_formulas))?;
        writeln!(f, "• Complex Formulas: {}", thousands(formulas.complex_formulas))?;
        writeln!(f, "• Simple Formulas: {}", thousands(formulas.simple_formulas))?;
        writeln!(f, "• Complexity Ratio: {:.1}%", formulas.complexity_ratio * 100.0)?;
        if !formulas.formula_types.is_empty() {
            let mut ranked: Vec<(&String, &usize)> = formulas.formula_types.iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(a.1));
            let top: Vec<String> = ranked
                .into_iter()
                .take(TOP_FUNCTIONS)
                .map(|(name, count)| format!("{}({})", name, count))
                .collect();
            writeln!(f, "• Most Used Functions: {}", top.join(", "))?;
        }

        section(f, "🔄 BUSINESS PROCESS PATTERNS")?;
        let patterns = &details.pattern_analysis;
        if patterns.detected_patterns.is_empty() {
            writeln!(f, "• No clear automation patterns detected")?;
        } else {
            for pattern in &patterns.detected_patterns {
                writeln!(f, "• {}", pattern)?;
            }
        }
        if !patterns.business_indicators.is_empty() {
            writeln!(f)?;
            writeln!(f, "Business Process Indicators:")?;
            for indicator in &patterns.business_indicators {
                writeln!(f, "• {}", indicator)?;
            }
        }

        if !a.opportunities.is_empty() {
            section(f, "✅ AUTOMATION OPPORTUNITIES")?;
            numbered(f, &a.opportunities)?;
        }

        if !a.red_flags.is_empty() {
            section(f, "⚠️  RED FLAGS & CHALLENGES")?;
            numbered(f, &a.red_flags)?;
        }

        section(f, "🛠️  RECOMMENDED AUTOMATION APPROACHES")?;
        if a.recommended_tools.is_empty() {
            writeln!(f, "No specific tool recommendations available")?;
        } else {
            numbered(f, &a.recommended_tools)?;
        }

        section(f, "💡 RECOMMENDED NEXT STEPS")?;
        let (heading, steps) = next_steps(a.overall_score);
        writeln!(f, "{}", heading)?;
        for step in steps {
            writeln!(f, "   → {}", step)?;
        }

        let completeness = details.quality_metrics.analysis_completeness;
        if completeness < 100.0 {
            writeln!(f)?;
            writeln!(f, "📊 Analysis Completeness: {:.0}%", completeness)?;
            if completeness < 80.0 {
                writeln!(f, "⚠️  Some analysis components failed - results may be incomplete")?;
            }
        }

        if !details.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Notes:")?;
            for warning in &details.warnings {
                writeln!(f, "• {}", warning)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "-".repeat(SECTION_WIDTH))
}

fn numbered<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        writeln!(f, "{}. {}", i + 1, item)?;
    }
    Ok(())
}

fn next_steps(score: f64) -> (&'static str, [&'static str; 4]) {
    if score >= 70.0 {
        (
            "✅ PROCEED WITH AUTOMATION:",
            [
                "This file is an excellent candidate for automation",
                "Start with the highest-rated tools above",
                "Focus on the identified opportunities",
                "Consider starting with a pilot implementation",
            ],
        )
    } else if score >= 50.0 {
        (
            "⚠️  PROCEED WITH PREPARATION:",
            [
                "This file can be automated with some preparation work",
                "Address the identified red flags first",
                "Consider restructuring the most problematic areas",
                "Plan for longer development timeline",
            ],
        )
    } else if score >= 30.0 {
        (
            "🔄 RESTRUCTURE BEFORE AUTOMATION:",
            [
                "Significant preparation work required",
                "Consider redesigning the most complex parts",
                "Evaluate if manual process redesign is better",
                "Use RPA tools if structure cannot be changed",
            ],
        )
    } else {
        (
            "❌ AUTOMATION NOT RECOMMENDED:",
            [
                "File requires major restructuring before automation",
                "Consider complete process redesign",
                "Manual optimization may be more cost-effective",
                "Consult with process improvement specialists",
            ],
        )
    }
}

fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
