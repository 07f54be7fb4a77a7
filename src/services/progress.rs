use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};

use crate::models::progress::ProgressSummary;
use crate::models::schedule::ScheduledTask;

/// Completion summary of `schedule`. Only `task` items count towards the
/// totals; `current_item_id` may point at a break.
pub fn compute_progress(
    schedule: &[ScheduledTask],
    completed: &HashSet<String>,
    now: DateTime<FixedOffset>,
) -> ProgressSummary {
    let tasks: Vec<&ScheduledTask> = schedule.iter().filter(|item| item.is_task()).collect();
    let done: Vec<&&ScheduledTask> = tasks
        .iter()
        .filter(|item| completed.contains(&item.id))
        .collect();

    let total_tasks = tasks.len();
    let completed_tasks = done.len();
    let percentage = if total_tasks == 0 {
        0.0
    } else {
        completed_tasks as f64 / total_tasks as f64 * 100.0
    };

    ProgressSummary {
        total_tasks,
        completed_tasks,
        percentage,
        total_minutes: tasks.iter().map(|item| item.duration).sum(),
        completed_minutes: done.iter().map(|item| item.duration).sum(),
        current_item_id: schedule
            .iter()
            .find(|item| item.is_active_at(now))
            .map(|item| item.id.clone()),
    }
}
