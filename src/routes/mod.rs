use std::sync::Arc;

use axum::{routing::get, Router};

use crate::config::Config;

pub mod assessments;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// The full service router with state attached.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes())
        .merge(assessments::routes())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
