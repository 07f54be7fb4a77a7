use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::models::ai_types::{
    BatchBreakAdviceRequest, BatchBreakAdviceResponse, BreakAdviceRequest, BreakAdviceResponse,
};
use crate::services::break_advice::GENERIC_ADVICE;

use super::{AppState, CommandResult};

pub(crate) async fn break_advice_impl(
    app_state: &AppState,
    request: BreakAdviceRequest,
) -> BreakAdviceResponse {
    debug!(
        target: "app::command",
        task_name = %request.task_name,
        time_of_day = request.time_of_day.as_deref().unwrap_or("-"),
        "break_advice invoked"
    );

    let advice = app_state.break_advice().advise(&request).await;
    BreakAdviceResponse { advice }
}

pub(crate) async fn break_advice_batch_impl(
    app_state: &AppState,
    request: BatchBreakAdviceRequest,
) -> BatchBreakAdviceResponse {
    let advice = app_state
        .break_advice()
        .advise_for_schedule(&request.schedule)
        .await;

    debug!(target: "app::command", breaks = advice.len(), "break_advice_batch completed");
    BatchBreakAdviceResponse { advice }
}

/// Always answers with advice; an unreadable body gets the generic text.
pub async fn break_advice(
    State(state): State<AppState>,
    payload: Result<Json<BreakAdviceRequest>, JsonRejection>,
) -> Json<BreakAdviceResponse> {
    match payload {
        Ok(Json(request)) => Json(break_advice_impl(&state, request).await),
        Err(rejection) => {
            debug!(
                target: "app::command",
                error = %rejection.body_text(),
                "break_advice body unreadable; using generic advice"
            );
            Json(BreakAdviceResponse {
                advice: GENERIC_ADVICE.to_string(),
            })
        }
    }
}

pub async fn break_advice_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchBreakAdviceRequest>, JsonRejection>,
) -> CommandResult<Json<BatchBreakAdviceResponse>> {
    let Json(request) = payload?;
    Ok(Json(break_advice_batch_impl(&state, request).await))
}
