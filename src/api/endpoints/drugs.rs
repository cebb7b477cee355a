//! Drug lookup endpoint.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DrugLookupResponse};
use crate::safety::resolver::resolve_one;

/// `GET /api/drugs/:name`: resolve a name the same way evaluation does.
pub async fn lookup(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> Result<Json<DrugLookupResponse>, ApiError> {
    let published = ctx.core.knowledge()?;
    let kb = &published.base;

    let (id, tier) = resolve_one(kb, &name)
        .ok_or_else(|| ApiError::NotFound(format!("No drug matches {name:?}")))?;
    let drug = kb
        .lookup(id)
        .cloned()
        .ok_or_else(|| ApiError::Internal(format!("alias resolved to unregistered id {id}")))?;

    Ok(Json(DrugLookupResponse {
        query: name,
        matched_by: tier,
        drug,
    }))
}
