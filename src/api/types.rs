//! Shared types for the API layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core_state::CoreState;
use crate::safety::knowledge::DrugRecord;
use crate::safety::types::MatchTier;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// `POST /api/safety/evaluate` body. `null` entries stand for missing text.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub medications: Vec<Option<String>>,
}

impl EvaluateRequest {
    /// Entries with `null` replaced by the empty string, order preserved.
    pub fn into_texts(self) -> Vec<String> {
        self.medications
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect()
    }
}

/// `GET /api/drugs/:name` response.
#[derive(Debug, Serialize)]
pub struct DrugLookupResponse {
    pub query: String,
    pub matched_by: MatchTier,
    pub drug: DrugRecord,
}
