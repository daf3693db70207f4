pub mod error;
pub mod handlers;

pub use error::{ApiError, ErrorResponse};

use crate::aggregator::DlpAggregator;
use crate::summarizer::Summarizer;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<DlpAggregator>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AppState {
    pub fn new(aggregator: DlpAggregator, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            summarizer,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/dlps", get(handlers::list_dlps))
        .route("/api/dlps/refresh", post(handlers::refresh_dlps))
        .route("/api/dlps/highlights", get(handlers::get_highlights))
        .route("/api/dlps/:id/trends", get(handlers::get_trends))
        .route("/api/summarize", post(handlers::summarize_metadata))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
