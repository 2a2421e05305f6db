mod assistant;
mod config;
mod content;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::registry::SessionRegistry;
use crate::config::Config;
use crate::content::ContentStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::{AppState, ModelHandle};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Folio v{}", env!("CARGO_PKG_VERSION"));

    // Warm the content cache; unreadable content is fatal
    let store = Arc::new(ContentStore::new(
        config.content_dir.clone(),
        config.content_cache_ttl,
    ));
    let projects = store
        .list_projects()
        .with_context(|| format!("Failed to load portfolio content from {}", store.root().display()))?;
    let about = store.get_about().context("Failed to load about page")?;
    if let Some(name) = about.as_ref().and_then(|a| a.name()) {
        info!("About page loaded for {name}");
    }
    info!(
        "Content store ready: {} projects, TTL {}s",
        projects.len(),
        config.content_cache_ttl.as_secs()
    );

    // Initialize generation client; failure only disables chat
    let model = match LlmClient::new(
        &config.generation_url,
        config.generation_api_key.clone(),
        config.generation_model.clone(),
        config.assistant.generation_timeout,
    ) {
        Ok(client) => {
            info!("Generation client initialized (model: {})", config.generation_model);
            ModelHandle::Ready(Arc::new(client))
        }
        Err(e) => {
            error!("Generation client failed to initialize, chat disabled: {e}");
            ModelHandle::Failed(e.to_string())
        }
    };

    // Build app state
    let state = AppState {
        store,
        model,
        sessions: Arc::new(SessionRegistry::new(config.max_sessions)),
        assistant: Arc::new(config.assistant.clone()),
    };

    // Build router
    let app = build_router(state, &config.static_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
