//! Knowledge-base status and hot reload.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::core_state::KnowledgeStatus;

/// `GET /api/knowledge`: currently published base.
pub async fn status(State(ctx): State<ApiContext>) -> Result<Json<KnowledgeStatus>, ApiError> {
    Ok(Json(ctx.core.knowledge()?.status()))
}

/// `POST /api/knowledge/reload`: rebuild from the configured source.
///
/// Validation failures return 422 and leave the current base published.
pub async fn reload(State(ctx): State<ApiContext>) -> Result<Json<KnowledgeStatus>, ApiError> {
    let core = ctx.core.clone();
    let status = tokio::task::spawn_blocking(move || core.reload_from_source())
        .await
        .map_err(|e| ApiError::Internal(format!("reload task failed: {e}")))??;

    Ok(Json(status))
}
