mod config;
mod errors;
mod llm_client;
mod refinement;
mod routes;
mod session;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::Session;
use crate::state::AppState;
use crate::store::{FileStore, KeyValueStore, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Heartfelt v{}", env!("CARGO_PKG_VERSION"));

    // Usage counter backend
    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::connect(url).await?),
        None => Arc::new(FileStore::new(config.usage_store_path.clone())),
    };
    info!("Usage store initialized (backend: {})", store.backend());

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone())?;
    info!(
        "LLM client initialized (scan: {}, refine: {})",
        llm_client::SCAN_MODEL,
        llm_client::REFINE_MODEL
    );

    let session = Session::start(Arc::new(llm), store, config.timings()).await;
    let state = AppState { session };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
