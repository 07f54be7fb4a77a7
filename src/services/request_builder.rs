use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::schedule::NormalizedRequest;
use crate::models::task::Task;
use crate::services::schedule_utils::{parse_clock, resolve_wall_clock};

pub const MIN_TASK_MINUTES: u32 = 5;
pub const MAX_TASK_MINUTES: u32 = 240;

/// Validates a raw scheduling request and produces its canonical shape.
pub struct ScheduleRequestBuilder;

impl ScheduleRequestBuilder {
    /// Checks the task list and `HH:MM` start time, then pins the start time
    /// to `now`'s calendar day as a wall-clock time in `timezone`.
    ///
    /// The returned tasks are a copy: ids filled in, names trimmed, and
    /// ordered by time slot then by descending priority. Downstream sorts are
    /// stable, so priority becomes the tie-break between equal durations.
    pub fn normalize(
        tasks: &[Task],
        start_time: Option<&str>,
        now: DateTime<FixedOffset>,
        timezone: Option<Tz>,
    ) -> AppResult<NormalizedRequest> {
        if tasks.is_empty() {
            return Err(AppError::validation("no tasks provided"));
        }

        let start_time = start_time
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::validation("start time is required"))?;
        let (hour, minute) = parse_clock(start_time)?;
        let start_date_time =
            resolve_wall_clock(now.date_naive(), hour * 60 + minute, timezone, *now.offset())?;

        let mut seen = HashSet::with_capacity(tasks.len());
        let mut normalized = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.iter().enumerate() {
            let mut task = task.clone();

            task.name = task.name.trim().to_string();
            if task.name.is_empty() {
                return Err(AppError::validation_with_details(
                    "task name must not be empty",
                    json!({ "index": index }),
                ));
            }

            if !(MIN_TASK_MINUTES..=MAX_TASK_MINUTES).contains(&task.estimated_duration) {
                return Err(AppError::validation_with_details(
                    format!(
                        "task duration must be between {MIN_TASK_MINUTES} and {MAX_TASK_MINUTES} minutes"
                    ),
                    json!({ "index": index, "estimatedDuration": task.estimated_duration }),
                ));
            }

            task.id = task.id.trim().to_string();
            if task.id.is_empty() {
                task.id = format!("task_{}", Uuid::new_v4().simple());
            }
            if !seen.insert(task.id.clone()) {
                return Err(AppError::validation_with_details(
                    "task ids must be unique",
                    json!({ "id": task.id }),
                ));
            }

            normalized.push(task);
        }

        normalized.sort_by_key(|task| (task.preferred_time_slot, Reverse(task.priority)));

        debug!(
            target: "app::schedule",
            task_count = normalized.len(),
            start = %start_date_time,
            "normalized scheduling request"
        );

        Ok(NormalizedRequest {
            tasks: normalized,
            start_date_time,
            timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TimeSlot};

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-05-01T07:12:00-05:00").expect("valid datetime")
    }

    #[test]
    fn normalize_combines_start_time_with_today() {
        let tasks = vec![Task::new("a", "Write report", 30, TimeSlot::Morning)];
        let request = ScheduleRequestBuilder::normalize(&tasks, Some("09:15"), now(), None).unwrap();
        assert_eq!(
            request.start_date_time.to_rfc3339(),
            "2025-05-01T09:15:00-05:00"
        );
        assert_eq!(request.tasks, tasks);
    }

    #[test]
    fn normalize_reads_start_time_in_configured_zone() {
        // 01:30 EST on the night clocks spring forward
        let before_jump =
            DateTime::parse_from_rfc3339("2025-03-09T01:30:00-05:00").expect("valid datetime");
        let tasks = vec![Task::new("a", "Run", 30, TimeSlot::Morning)];

        let request = ScheduleRequestBuilder::normalize(
            &tasks,
            Some("09:00"),
            before_jump,
            Some(chrono_tz::America::New_York),
        )
        .unwrap();
        assert_eq!(request.start_date_time.to_rfc3339(), "2025-03-09T09:00:00-04:00");
        assert_eq!(request.timezone, Some(chrono_tz::America::New_York));
    }

    #[test]
    fn normalize_rejects_empty_tasks_and_bad_start_time() {
        let tasks = vec![Task::new("a", "Read", 30, TimeSlot::Evening)];

        assert!(matches!(
            ScheduleRequestBuilder::normalize(&[], Some("09:00"), now(), None),
            Err(AppError::Validation { .. })
        ));
        for start in [None, Some(""), Some("9am"), Some("24:00"), Some("10:61")] {
            assert!(
                matches!(
                    ScheduleRequestBuilder::normalize(&tasks, start, now(), None),
                    Err(AppError::Validation { .. })
                ),
                "{start:?} should be rejected"
            );
        }
    }

    #[test]
    fn normalize_validates_tasks() {
        let blank = vec![Task::new("a", "   ", 30, TimeSlot::Morning)];
        assert!(ScheduleRequestBuilder::normalize(&blank, Some("09:00"), now(), None).is_err());

        let too_short = vec![Task::new("a", "Tidy", 4, TimeSlot::Morning)];
        assert!(ScheduleRequestBuilder::normalize(&too_short, Some("09:00"), now(), None).is_err());

        let too_long = vec![Task::new("a", "Tidy", 241, TimeSlot::Morning)];
        assert!(ScheduleRequestBuilder::normalize(&too_long, Some("09:00"), now(), None).is_err());

        let duplicated = vec![
            Task::new("a", "One", 30, TimeSlot::Morning),
            Task::new("a", "Two", 30, TimeSlot::Evening),
        ];
        assert!(ScheduleRequestBuilder::normalize(&duplicated, Some("09:00"), now(), None).is_err());
    }

    #[test]
    fn normalize_fills_ids_and_orders_by_slot_then_priority() {
        let tasks = vec![
            Task::new("e", "Evening walk", 30, TimeSlot::Evening),
            Task::new("m-low", "Laundry", 30, TimeSlot::Morning).with_priority(TaskPriority::Low),
            Task::new("", "  Email boss ", 15, TimeSlot::Morning)
                .with_priority(TaskPriority::High),
        ];

        let request = ScheduleRequestBuilder::normalize(&tasks, Some("08:00"), now(), None).unwrap();
        let names: Vec<&str> = request.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Email boss", "Laundry", "Evening walk"]);
        assert!(request.tasks[0].id.starts_with("task_"));

        // the caller's slice is untouched
        assert_eq!(tasks[2].name, "  Email boss ");
        assert!(tasks[2].id.is_empty());
    }
}
