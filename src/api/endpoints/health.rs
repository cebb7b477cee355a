//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::safety::types::KnowledgeBaseStamp;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub knowledge_base: KnowledgeBaseStamp,
}

/// `GET /api/health`: liveness plus the published knowledge-base identity.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let published = ctx.core.knowledge()?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        knowledge_base: KnowledgeBaseStamp {
            version: published.base.version().to_string(),
            generation: published.generation,
        },
    }))
}
