use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream;
use serde::Deserialize;

use super::sse::{delta_events, json_event};
use super::AppState;
use crate::engine::discover::{
    available_materials, is_materials_question, process_discover_turn, DiscoverResult,
    DiscoverState, DiscoverUpdates,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    pub state: Option<DiscoverState>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub stream: bool,
}

/// `POST /api/discover`: one discovery turn. A materials question is
/// answered straight from the filtered inventory without a model call.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DiscoverRequest>,
) -> Result<Response, AppError> {
    let discover_state = request
        .state
        .ok_or_else(|| AppError::Validation("Missing state or userMessage".into()))?;
    if request.user_message.is_empty() {
        return Err(AppError::Validation("Missing state or userMessage".into()));
    }

    let result = if is_materials_question(&request.user_message) {
        materials_answer(&state, &discover_state)
    } else {
        process_discover_turn(
            state.backend.as_ref(),
            &state.inventory,
            &discover_state,
            &request.user_message,
        )
        .await
    };

    if request.stream {
        return Ok(stream_result(result));
    }
    Ok(Json(result).into_response())
}

fn materials_answer(state: &AppState, discover_state: &DiscoverState) -> DiscoverResult {
    let materials = available_materials(&state.inventory, &discover_state.constraints);
    let assistant_message = if materials.is_empty() {
        "I can work with cotton, organic cotton, recycled blends, canvas, and ceramic. Do you have a preference?".to_string()
    } else {
        format!(
            "Available materials right now: {}. Do you have a preference?",
            materials.join(", ")
        )
    };

    DiscoverResult {
        assistant_message,
        updates: DiscoverUpdates {
            constraints: Default::default(),
            stage: discover_state.stage,
        },
        results: Vec::new(),
        fallback_used: false,
    }
}

fn stream_result(result: DiscoverResult) -> Response {
    let mut events = vec![
        json_event("updates", &result.updates),
        json_event("results", &result.results),
    ];
    events.extend(delta_events(&result.assistant_message));
    let done = if result.fallback_used {
        serde_json::json!({ "fallbackUsed": true, "error": "model backend unavailable" })
    } else {
        serde_json::json!({ "fallbackUsed": false })
    };
    events.push(json_event("done", &done));

    let stream = stream::iter(events.into_iter().map(Ok::<_, Infallible>));
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}
