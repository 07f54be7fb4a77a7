use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, warn};

use crate::models::schedule::{ScheduleRequest, ScheduleResponse};

use super::{AppState, CommandError, CommandResult};

pub(crate) async fn schedule_create_impl(
    app_state: &AppState,
    request: ScheduleRequest,
) -> CommandResult<ScheduleResponse> {
    debug!(
        target: "app::command",
        task_count = request.tasks.len(),
        start_time = request.start_time.as_deref().unwrap_or("-"),
        "schedule_create invoked"
    );

    let outcome = app_state.schedules().create_schedule(&request).await?;

    if let Err(error) = app_state.session().record_schedule(&outcome.schedule) {
        warn!(
            target: "app::command",
            error = %error,
            "schedule created but not persisted"
        );
    }

    debug!(
        target: "app::command",
        source = ?outcome.source,
        items = outcome.schedule.len(),
        generated_at = %outcome.generated_at.to_rfc3339(),
        "schedule_create completed"
    );

    Ok(ScheduleResponse {
        schedule: outcome.schedule,
    })
}

pub(crate) fn schedule_latest_impl(app_state: &AppState) -> CommandResult<ScheduleResponse> {
    let schedule = app_state.session().latest_schedule()?;
    Ok(ScheduleResponse { schedule })
}

pub(crate) fn schedule_reset_impl(app_state: &AppState) -> CommandResult<()> {
    app_state.session().reset().map_err(CommandError::from)
}

pub async fn create_schedule(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> CommandResult<Json<ScheduleResponse>> {
    let Json(request) = payload?;
    schedule_create_impl(&state, request).await.map(Json)
}

pub async fn latest_schedule(State(state): State<AppState>) -> CommandResult<Json<ScheduleResponse>> {
    schedule_latest_impl(&state).map(Json)
}

pub async fn reset_schedule(State(state): State<AppState>) -> CommandResult<StatusCode> {
    schedule_reset_impl(&state)?;
    Ok(StatusCode::NO_CONTENT)
}
