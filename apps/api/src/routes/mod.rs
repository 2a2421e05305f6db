pub mod health;

use std::path::Path;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::assistant::handlers as chat;
use crate::content::handlers as content;
use crate::state::AppState;

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Content API
        .route("/api/portfolio-data", get(content::handle_portfolio_data))
        .route("/api/projects/:id", get(content::handle_get_project))
        // Assistant API
        .route("/api/status", get(chat::handle_status))
        .route("/api/chat", post(chat::handle_chat))
        .route("/api/chat/session", post(chat::handle_new_session))
        .route("/api/chat/:session_id", delete(chat::handle_end_session))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}
