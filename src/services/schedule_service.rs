use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Timelike};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::schedule::{
    NormalizedRequest, ScheduleOutcome, ScheduleRequest, ScheduleSource, ScheduledTask,
};
use crate::services::ai_response_parser::validate_task_coverage;
use crate::services::ai_service::AiService;
use crate::services::request_builder::ScheduleRequestBuilder;
use crate::services::schedule_assembler::{find_overlap, ScheduleAssembler};
use crate::services::schedule_utils::local_now;
use crate::services::time_slot_scheduler::TimeSlotScheduler;

/// Runs one scheduling request: AI first, deterministic planner on any AI
/// failure. AI failures never reach the caller.
#[derive(Clone)]
pub struct ScheduleService {
    ai: AiService,
    timezone: Option<Tz>,
}

impl ScheduleService {
    pub fn new(ai: AiService, timezone: Option<Tz>) -> Self {
        Self { ai, timezone }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        local_now(self.timezone)
    }

    pub async fn create_schedule(&self, request: &ScheduleRequest) -> AppResult<ScheduleOutcome> {
        self.create_schedule_at(request, self.now()).await
    }

    /// Same as [`create_schedule`](Self::create_schedule) with "today" and the
    /// offset taken from `now`.
    pub async fn create_schedule_at(
        &self,
        request: &ScheduleRequest,
        now: DateTime<FixedOffset>,
    ) -> AppResult<ScheduleOutcome> {
        let normalized = ScheduleRequestBuilder::normalize(
            &request.tasks,
            request.start_time.as_deref(),
            now,
            self.timezone,
        )?;

        let (schedule, source) = match self.ai_schedule(&normalized).await {
            Ok(schedule) => (schedule, ScheduleSource::Ai),
            Err(error) => {
                if error.is_ai_unavailable() {
                    info!(
                        target: "app::schedule",
                        reason = %error,
                        ai_configured = self.ai.is_configured(),
                        "AI unavailable; using time-slot planner"
                    );
                } else {
                    warn!(
                        target: "app::schedule",
                        reason = %error,
                        "AI schedule rejected; using time-slot planner"
                    );
                }
                (Self::fallback_schedule(&normalized)?, ScheduleSource::Fallback)
            }
        };

        info!(
            target: "app::schedule",
            source = ?source,
            tasks = normalized.tasks.len(),
            items = schedule.len(),
            "schedule created"
        );

        Ok(ScheduleOutcome {
            schedule,
            source,
            generated_at: now,
        })
    }

    async fn ai_schedule(&self, request: &NormalizedRequest) -> AppResult<Vec<ScheduledTask>> {
        let items = self
            .ai
            .interpret(&request.tasks, request.start_date_time)
            .await?;
        validate_task_coverage(&items, &request.tasks)?;

        let schedule =
            ScheduleAssembler::assemble(&items, request.start_date_time, request.timezone)?;
        validate_placement(&schedule, request)?;
        if let Some((first, second)) = find_overlap(&schedule) {
            return Err(AppError::ai_parse(format!(
                "AI schedule items '{first}' and '{second}' overlap"
            )));
        }

        Ok(schedule)
    }

    fn fallback_schedule(request: &NormalizedRequest) -> AppResult<Vec<ScheduledTask>> {
        let items = TimeSlotScheduler::schedule(&request.tasks, request.start_date_time);

        let placed = items
            .iter()
            .filter(|item| item.original_task_id.is_some())
            .count();
        let dropped = request.tasks.len().saturating_sub(placed);
        if dropped > 0 {
            warn!(
                target: "app::schedule",
                dropped,
                "tasks whose time slot already ended were left out"
            );
        }

        let schedule = ScheduleAssembler::assemble(&items, request.start_date_time, request.timezone)
            .map_err(|error| {
                AppError::scheduling(format!(
                    "time-slot planner output could not be assembled: {error}"
                ))
            })?;
        debug!(target: "app::schedule", items = schedule.len(), "fallback schedule assembled");

        Ok(schedule)
    }
}

/// Holds an assembled AI schedule to the planner's guarantees: nothing
/// starts before the requested start, and every task starts inside its
/// preferred slot's window.
fn validate_placement(schedule: &[ScheduledTask], request: &NormalizedRequest) -> AppResult<()> {
    let slots: HashMap<&str, _> = request
        .tasks
        .iter()
        .map(|task| (task.id.as_str(), task.preferred_time_slot))
        .collect();

    for item in schedule {
        if item.start_time < request.start_date_time {
            return Err(AppError::ai_parse(format!(
                "AI schedule item '{}' starts before {}",
                item.id, request.start_date_time
            )));
        }

        let Some(slot) = item
            .original_task_id
            .as_deref()
            .and_then(|task_id| slots.get(task_id).copied())
        else {
            continue;
        };
        if !slot.window().contains_hour(item.start_time.hour()) {
            return Err(AppError::ai_parse(format!(
                "AI schedule item '{}' is outside the {} slot",
                item.id,
                slot.as_str()
            )));
        }
    }

    Ok(())
}
