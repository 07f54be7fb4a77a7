use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::models::ai_types::AiStatusDto;

use super::AppState;

pub(crate) fn ai_status_impl(app_state: &AppState) -> AiStatusDto {
    let status = app_state.ai().status();
    debug!(target: "app::command", has_api_key = status.has_api_key, "ai_status completed");
    status
}

pub async fn ai_status(State(state): State<AppState>) -> Json<AiStatusDto> {
    Json(ai_status_impl(&state))
}

pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}
