use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sheet_automation::{
    assess_at, config::Config, logging, routes,
    services::{file_processor, report},
};

#[derive(Parser, Debug)]
#[command(name = "sheet-automation")]
#[command(about = "Excel automation feasibility checker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assess one workbook and print the feasibility report
    Check {
        /// Workbook to analyze (.xlsx, .xlsm, .xls)
        path: PathBuf,

        /// Print the assessment as JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Where to write the text report (defaults to a timestamped name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip writing the text report file
        #[arg(long)]
        no_export: bool,
    },
    /// Run the HTTP service
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    let cli = Cli::parse();
    let config = Config::new()?;

    match cli.command {
        Commands::Check {
            path,
            json,
            output,
            no_export,
        } => check(&path, &config, json, output, no_export),
        Commands::Serve => serve(config).await,
    }
}

fn check(
    path: &Path,
    config: &Config,
    json: bool,
    output: Option<PathBuf>,
    no_export: bool,
) -> Result<()> {
    let workbook = file_processor::load_workbook(path)?;
    let now = Local::now().naive_local();
    let assessment = assess_at(&workbook, &config.analysis, now);
    let text = report::render_text(&assessment);

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        println!("{}", text);
    }

    if !no_export {
        let target = output.unwrap_or_else(|| {
            PathBuf::from(report::default_report_name(&path.to_string_lossy(), now))
        });
        std::fs::write(&target, &text)
            .with_context(|| format!("Failed to export report to {}", target.display()))?;
        tracing::info!("Report exported to: {}", target.display());
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let addr = config.bind_addr;
    let state = Arc::new(routes::AppState::new(config));
    let app = routes::app(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
