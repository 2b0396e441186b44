use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::engine::design::{generate_variants, GeneratedDesigns};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRequest {
    #[serde(default)]
    pub text: String,
    pub icon_id: Option<String>,
    pub vibe: Option<String>,
    pub occasion: Option<String>,
}

/// `POST /api/designs`: three variants for the current design tuple.
/// Generation never fails outright (templates back it up), so the only
/// error here is a request with nothing to design.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DesignRequest>,
) -> Result<Json<GeneratedDesigns>, AppError> {
    if request.text.is_empty() && request.icon_id.is_none() {
        return Err(AppError::Validation("Missing text or iconId".into()));
    }

    let designs = generate_variants(
        state.backend.as_ref(),
        &request.text,
        request.icon_id.as_deref(),
        request.vibe.as_deref(),
        request.occasion.as_deref(),
    )
    .await;

    Ok(Json(designs))
}
