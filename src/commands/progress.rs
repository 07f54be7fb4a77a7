use axum::extract::{Path, State};
use axum::Json;
use tracing::debug;

use crate::models::progress::{CompletionToggleResponse, ProgressSummary};

use super::{AppState, CommandResult};

pub(crate) fn completion_toggle_impl(
    app_state: &AppState,
    task_id: String,
) -> CommandResult<CompletionToggleResponse> {
    let completed = app_state.session().toggle_completion(&task_id)?;
    debug!(target: "app::command", %task_id, completed, "completion_toggle completed");
    Ok(CompletionToggleResponse { task_id, completed })
}

pub(crate) fn progress_impl(app_state: &AppState) -> CommandResult<ProgressSummary> {
    let now = app_state.schedules().now();
    Ok(app_state.session().progress(now)?)
}

pub async fn toggle_completion(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> CommandResult<Json<CompletionToggleResponse>> {
    completion_toggle_impl(&state, task_id).map(Json)
}

pub async fn progress(State(state): State<AppState>) -> CommandResult<Json<ProgressSummary>> {
    progress_impl(&state).map(Json)
}
