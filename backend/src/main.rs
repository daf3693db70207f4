use dlp_rankings_backend::{
    aggregator::DlpAggregator,
    api::{create_router, AppState},
    config::AppConfig,
    sources::build_sources,
    summarizer::{GeminiSummarizer, Summarizer},
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    info!(
        "⚙️  Vana chain {} via {} RPC endpoint(s), {:?} performance strategy",
        config.chain_id,
        config.rpc_urls.len(),
        config.strategy
    );

    let (registry, performance) = build_sources(&config);
    let aggregator = DlpAggregator::new(registry, performance, &config);
    info!("✅ DLP aggregator initialized (default epoch {})", config.default_epoch);

    if config.summarizer.api_key.is_none() {
        warn!("GEMINI_API_KEY not set, metadata summaries will be unavailable");
    }
    let summarizer: Arc<dyn Summarizer> =
        Arc::new(GeminiSummarizer::new(config.summarizer.clone())?);
    info!("✅ Metadata summarizer initialized ({})", config.summarizer.model);

    let app = create_router(AppState::new(aggregator, summarizer));

    info!("🔧 Routes configured:");
    info!("  - /health");
    info!("  - /api/dlps, /api/dlps/refresh, /api/dlps/highlights, /api/dlps/:id/trends");
    info!("  - /api/summarize");
    info!("🚀 Starting server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("🎯 Server bound to {}, starting HTTP service...", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
