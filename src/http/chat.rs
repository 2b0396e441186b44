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
use crate::engine::conversation::{process_turn, ConversationState, EngineResult, Message};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub state: Option<ConversationState>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub stream: bool,
}

/// `POST /api/chat`: one customization turn. Non-stream replies with the
/// engine result as JSON; `stream: true` replays it as an `updates` event,
/// chunked `delta` events, and a terminal `done`.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let conversation = request
        .state
        .ok_or_else(|| AppError::Validation("Missing state or userMessage".into()))?;
    if request.user_message.is_empty() {
        return Err(AppError::Validation("Missing state or userMessage".into()));
    }

    let result = process_turn(
        state.backend.as_ref(),
        &conversation,
        &request.user_message,
        &request.messages,
        &state.limits,
    )
    .await;

    if request.stream {
        return Ok(stream_result(result));
    }
    Ok(Json(result).into_response())
}

fn stream_result(result: EngineResult) -> Response {
    let mut events = vec![json_event("updates", &result.updates)];
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
