//! Axum route handlers for the portfolio content API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::content::{ContentError, ContentStore};
use crate::errors::AppError;
use crate::models::portfolio::{PortfolioData, Project};
use crate::state::AppState;

/// GET /api/portfolio-data
///
/// All projects plus the about page (`null` when absent).
pub async fn handle_portfolio_data(
    State(state): State<AppState>,
) -> Result<Json<PortfolioData>, AppError> {
    let data = blocking(state.store, |store| {
        Ok(PortfolioData {
            projects: store.list_projects()?,
            about: store.get_about()?,
        })
    })
    .await?;
    Ok(Json(data))
}

/// GET /api/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Project>, AppError> {
    let lookup_id = id.clone();
    let project = blocking(state.store, move |store| match store.get_project(&lookup_id) {
        Err(ContentError::InvalidId(_)) => Ok(None),
        other => other,
    })
    .await?;

    project
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project '{id}' not found")))
}

/// Runs a filesystem-backed store call off the async executor.
async fn blocking<T, F>(store: Arc<ContentStore>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&ContentStore) -> Result<T, ContentError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Content task failed: {e}")))?
        .map_err(AppError::from)
}
