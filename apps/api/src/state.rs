use std::sync::Arc;

use crate::assistant::registry::SessionRegistry;
use crate::assistant::session::AssistantSettings;
use crate::content::ContentStore;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;

/// Outcome of generation-client initialization at startup.
#[derive(Clone)]
pub enum ModelHandle {
    Ready(Arc<dyn TextGenerator>),
    Failed(String),
}

impl ModelHandle {
    pub fn generator(&self) -> Result<&Arc<dyn TextGenerator>, AppError> {
        match self {
            ModelHandle::Ready(generator) => Ok(generator),
            ModelHandle::Failed(reason) => Err(AppError::ModelUnavailable(reason.clone())),
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            ModelHandle::Ready(_) => "Ready",
            ModelHandle::Failed(_) => "Failed to load model",
        }
    }
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub model: ModelHandle,
    pub sessions: Arc<SessionRegistry>,
    pub assistant: Arc<AssistantSettings>,
}
