use axum::{
    extract::State,
    http::{header, Method},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    models::Assessment,
    routes::AppState,
    services::{assessment, excel::read_workbook_bytes, file_processor, report},
};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/workbooks/assess", post(assess_workbook))
        .route("/workbooks/assess/report", post(assess_workbook_report))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct AssessRequest {
    file_name: String,
    signed_url: String,
}

async fn assess_workbook(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssessRequest>,
) -> Result<Json<Assessment>, AppError> {
    let assessment = run_assessment(&state, request).await?;
    Ok(Json(assessment))
}

async fn assess_workbook_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = run_assessment(&state, request).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report::render_text(&assessment),
    ))
}

async fn run_assessment(state: &AppState, request: AssessRequest) -> Result<Assessment, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Starting assessment for file: {}", request.file_name);

    file_processor::ensure_supported_name(&request.file_name)?;
    if request.signed_url.trim().is_empty() {
        return Err(AppError::InvalidInput("No signed_url provided".to_string()));
    }

    tracing::info!("Downloading file from URL...");
    let download_start = std::time::Instant::now();
    let file_data = file_processor::load_file_from_url(&request.signed_url).await?;
    tracing::info!(
        "File downloaded, size: {}KB, took: {:?}",
        file_data.len() / 1024,
        download_start.elapsed()
    );
    file_processor::ensure_within_limit(file_data.len() as u64, state.config.max_file_size)?;

    // Decoding and scanning are CPU-bound.
    let analysis = state.config.analysis.clone();
    let file_name = request.file_name;
    let assessment = tokio::task::spawn_blocking(move || {
        let workbook = read_workbook_bytes(&file_name, file_data)?;
        Ok::<_, AppError>(assessment::assess(&workbook, &analysis))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Assessment task failed: {}", e)))??;

    tracing::info!(
        "Assessment completed in {:?}: {}/100",
        start.elapsed(),
        assessment.overall_score
    );
    Ok(assessment)
}
