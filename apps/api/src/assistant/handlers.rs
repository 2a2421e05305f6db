//! Axum route handlers for the chat assistant.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::assistant::normalizer::AnswerSource;
use crate::assistant::prompts::welcome_message;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<Uuid>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub answer: String,
    pub source: AnswerSource,
}

#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: Uuid,
    pub welcome: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub model_status: &'static str,
    pub model: Option<String>,
    pub error: Option<String>,
    pub active_sessions: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/chat/session
///
/// Starts a conversation and returns the greeting. Unavailable while the model
/// failed to load.
pub async fn handle_new_session(
    State(state): State<AppState>,
) -> Result<Json<NewSessionResponse>, AppError> {
    state.model.generator()?;
    let (session_id, _) = state.sessions.create();
    info!("Started chat session {session_id}");

    Ok(Json(NewSessionResponse {
        session_id,
        welcome: welcome_message(&state.assistant.assistant_name),
    }))
}

/// POST /api/chat
///
/// Answers one message. Without `session_id` a new session is started.
/// A second message for a session whose previous answer is still being
/// generated is rejected with 409.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message cannot be empty".to_string()));
    }

    let generator = state.model.generator()?.clone();

    let (session_id, handle) = match request.session_id {
        Some(id) => {
            let handle = state
                .sessions
                .get(&id)
                .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
            (id, handle)
        }
        None => state.sessions.create(),
    };

    let mut session = handle.try_lock_owned().map_err(|_| {
        AppError::Conflict("A reply is still being generated for this session".to_string())
    })?;

    let answer = session
        .respond(message, &state.store, generator.as_ref(), &state.assistant)
        .await;
    info!(
        "Session {session_id}: answered ({:?}, {} projects)",
        answer.source, answer.matched_projects
    );

    Ok(Json(ChatResponse {
        session_id,
        answer: answer.text,
        source: answer.source,
    }))
}

/// DELETE /api/chat/:session_id
///
/// Forgets a conversation, like reloading the page.
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {session_id} not found")))
    }
}

/// GET /api/status
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let (model, error) = match state.model.generator() {
        Ok(generator) => (Some(generator.model().to_string()), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Json(StatusResponse {
        model_status: state.model.status_label(),
        model,
        error,
        active_sessions: state.sessions.len(),
    })
}
