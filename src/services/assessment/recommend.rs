use smallvec::SmallVec;

use crate::models::{Marker, Recommendation};

const MAX_RECOMMENDATIONS: usize = 8;

/// Aggregated metrics the recommendation rules are keyed on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecommendationInputs {
    pub overall_score: f64,
    pub complexity_ratio: f64,
    pub file_size_mb: f64,
    pub total_formulas: usize,
    pub has_macros: bool,
    /// Raw pattern score above 20.
    pub has_patterns: bool,
    pub time_based: bool,
    pub consolidation: bool,
    pub red_flags: usize,
}

const fn success(tool: &'static str, rationale: &'static str) -> Recommendation {
    Recommendation {
        marker: Marker::Success,
        tool,
        rationale,
    }
}

const fn caution(tool: &'static str, rationale: &'static str) -> Recommendation {
    Recommendation {
        marker: Marker::Caution,
        tool,
        rationale,
    }
}

/// Ordered, de-duplicated automation approaches, at most eight.
pub fn recommend(inputs: &RecommendationInputs) -> Vec<Recommendation> {
    tracing::info!("Generating automation tool recommendations...");
    let RecommendationInputs {
        overall_score: overall,
        complexity_ratio: complexity,
        file_size_mb: size,
        total_formulas,
        has_macros,
        has_patterns,
        time_based,
        consolidation,
        red_flags,
    } = *inputs;

    let mut tools: Vec<Recommendation> = Vec::new();

    if overall >= 70.0 && complexity < 0.4 && !has_macros {
        tools.push(success(
            "Python + pandas + openpyxl",
            "Ideal for data processing, calculations, and report generation",
        ));
        tools.push(success(
            "Python + xlwings",
            "Excel integration with Python logic, maintains Excel interface",
        ));
    } else if overall >= 50.0 && complexity < 0.6 {
        tools.push(caution(
            "Python + pandas",
            "Possible with formula logic replication effort",
        ));
    }

    if overall >= 60.0 && size < 30.0 && !has_macros {
        tools.push(success(
            "Microsoft Power Automate",
            "Excellent for workflow automation and Office 365 integration",
        ));
        tools.push(success(
            "Power BI + Power Query",
            "Perfect for reporting automation and data transformation",
        ));
    } else if overall >= 40.0 {
        tools.push(caution("Power Platform", "Possible with data restructuring"));
    }

    if has_macros || complexity > 0.5 || total_formulas > 500 {
        tools.push(success(
            "Enhanced VBA/Excel Macros",
            "Build upon existing logic, add automation triggers",
        ));
        tools.push(success(
            "Excel + VBA + Python integration",
            "Hybrid approach leveraging both platforms",
        ));
    } else if overall >= 60.0 {
        tools.push(success(
            "Excel VBA",
            "Native Excel automation for formula-heavy processes",
        ));
    }

    if overall < 50.0 || red_flags > 3 {
        tools.push(caution(
            "RPA Tools (UiPath, Automation Anywhere)",
            "For processes that can't be restructured",
        ));
        tools.push(caution(
            "Desktop automation",
            "When existing file structure must be preserved",
        ));
    }

    if has_patterns && size < 20.0 && overall >= 60.0 {
        tools.push(success(
            "Google Sheets + Apps Script",
            "Cloud-based collaborative automation",
        ));
        tools.push(success(
            "Office 365 + SharePoint + Power Automate",
            "Enterprise cloud automation suite",
        ));
    }

    if time_based {
        tools.push(success(
            "Scheduled automation scripts",
            "Perfect for periodic reporting",
        ));
    }
    if consolidation {
        tools.push(success(
            "ETL tools (SSIS, Alteryx)",
            "Specialized for data consolidation workflows",
        ));
    }

    if overall >= 50.0 && complexity < 0.3 {
        tools.push(success(
            "No-code platforms (Zapier, Microsoft Flow)",
            "Quick implementation option",
        ));
    }

    let mut unique: SmallVec<[Recommendation; MAX_RECOMMENDATIONS]> = SmallVec::new();
    for tool in tools {
        if unique.len() == MAX_RECOMMENDATIONS {
            break;
        }
        if !unique.contains(&tool) {
            unique.push(tool);
        }
    }

    tracing::info!("Generated {} tool recommendations", unique.len());
    unique.into_vec()
}
