mod candidates;
mod config;
mod db;
mod errors;
mod identity;
mod interview;
mod llm_client;
mod resume;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::candidates::store::PgProfileStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::interview::controller::InterviewController;
use crate::interview::gateway::LlmInterviewGateway;
use crate::interview::store::RedisStateStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("interview_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize LLM client (missing key => offline fallbacks)
    let llm = LlmClient::new(config.gemini_api_key.clone(), config.gemini_api_url.clone());
    info!(
        "LLM client initialized (model: {}, configured: {})",
        llm_client::MODEL,
        llm.is_configured()
    );

    let controller = Arc::new(InterviewController::new(
        Arc::new(LlmInterviewGateway::new(llm)),
        Arc::new(RedisStateStore::new(redis, config.interview_state_ttl_secs)),
        Arc::new(PgProfileStore::new(db.clone())),
    ));
    let profiles = controller.load_profiles().await?;
    info!("Loaded {profiles} candidate profile(s)");

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        controller,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the UI host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
