//! Safety evaluation endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, EvaluateRequest};
use crate::config::MAX_MEDICATIONS_PER_REQUEST;
use crate::safety::{SafetyEngine, SafetyReport};

/// `POST /api/safety/evaluate`: full report for one medication list.
///
/// Unknown medications never fail the request; they come back unresolved.
pub async fn evaluate(
    State(ctx): State<ApiContext>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<SafetyReport>, ApiError> {
    let Json(request) = payload?;

    if request.medications.len() > MAX_MEDICATIONS_PER_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "At most {MAX_MEDICATIONS_PER_REQUEST} medications per request, got {}",
            request.medications.len()
        )));
    }

    let texts = request.into_texts();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let engine = ctx.core.engine()?;

    Ok(Json(engine.evaluate_safety(&refs)))
}
