use crate::models::{FormulaSummary, PatternSummary, StructureReport};

use super::patterns::{END_TO_END_INDICATOR, MULTI_SOURCE_INDICATOR};

/// Positive counterparts of the risk scan, read from the same stage outputs.
pub fn identify(
    structure: &StructureReport,
    formulas: &FormulaSummary,
    patterns: &PatternSummary,
) -> Vec<String> {
    tracing::info!("Identifying automation opportunities...");
    let mut opportunities: Vec<String> = Vec::new();
    let mut note = |text: &str| opportunities.push(text.to_string());

    if patterns.time_based_patterns {
        note("Monthly/quarterly reporting can be fully automated with templates");
    }
    if patterns.consolidation_patterns {
        note("Data consolidation process has high ROI automation potential");
    }
    if patterns.repeated_structures {
        note("Repeated sheet structures can use template-based automation");
    }

    if structure.named_ranges > 0 {
        note("Named ranges indicate well-structured data - easier automation implementation");
    }
    if structure.total_sheets <= 10 {
        note("Manageable number of sheets - straightforward automation scope");
    }

    if formulas.simple_formulas as f64 > formulas.total_formulas as f64 * 0.7 {
        note("Majority of formulas are simple - easy to replicate in automation");
    }
    if formulas.total_formulas < 100 {
        note("Low formula complexity - minimal logic replication required");
    }

    let indicators = &patterns.business_process_indicators;
    if indicators.iter().any(|i| i == END_TO_END_INDICATOR) {
        note("Complete workflow automation possible - high impact potential");
    }
    if indicators.iter().any(|i| i == MULTI_SOURCE_INDICATOR) {
        note("Data integration automation can eliminate manual consolidation");
    }

    if structure.file_size_mb < 10.0 {
        note("Small file size enables cloud-based automation solutions");
    }

    let roles = &patterns.roles;
    if !roles.template.is_empty() {
        note("Master templates detected - can standardize and automate variations");
    }
    if !roles.data_entry.is_empty() {
        note("Data entry processes can be automated with forms or APIs");
    }
    if !roles.reporting.is_empty() {
        note("Report generation can be automated with scheduled processes");
    }

    if opportunities.len() >= 5 {
        opportunities.push("Multiple automation opportunities identified - high ROI potential".to_string());
    } else if opportunities.len() >= 3 {
        opportunities.push("Several automation opportunities - good ROI potential".to_string());
    }

    tracing::info!("Found {} automation opportunities", opportunities.len());
    opportunities
}
