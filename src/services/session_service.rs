use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, FixedOffset};
use serde_json::json;
use tracing::{debug, info};

use crate::db::store::{load_typed, save_typed, StatePort};
use crate::error::{AppError, AppResult};
use crate::models::progress::ProgressSummary;
use crate::models::schedule::ScheduledTask;
use crate::services::progress::compute_progress;

const KEY_LATEST_SCHEDULE: &str = "task_scheduler.latest_schedule";
const KEY_COMPLETED_TASKS: &str = "task_scheduler.completed_task_ids";

/// Latest schedule and its completion marks, kept behind a [`StatePort`].
///
/// Every read-modify-write runs under one lock shared by all clones, so
/// concurrent toggles and re-records never lose an update.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn StatePort>,
    writes: Arc<Mutex<()>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn StatePort>) -> Self {
        Self {
            store,
            writes: Arc::new(Mutex::new(())),
        }
    }

    fn write_guard(&self) -> AppResult<MutexGuard<'_, ()>> {
        self.writes
            .lock()
            .map_err(|_| AppError::other("session write lock poisoned"))
    }

    /// Replaces the stored schedule; completions of the previous one are dropped.
    pub fn record_schedule(&self, schedule: &[ScheduledTask]) -> AppResult<()> {
        let _guard = self.write_guard()?;
        save_typed(self.store.as_ref(), KEY_LATEST_SCHEDULE, &schedule)?;
        self.store.remove(KEY_COMPLETED_TASKS)?;
        info!(target: "app::schedule", items = schedule.len(), "session schedule recorded");
        Ok(())
    }

    pub fn latest_schedule(&self) -> AppResult<Vec<ScheduledTask>> {
        Ok(load_typed(self.store.as_ref(), KEY_LATEST_SCHEDULE)?.unwrap_or_default())
    }

    fn completed_ids(&self) -> AppResult<BTreeSet<String>> {
        Ok(load_typed(self.store.as_ref(), KEY_COMPLETED_TASKS)?.unwrap_or_default())
    }

    /// Flips the completion mark of a `task` item and returns the new state.
    pub fn toggle_completion(&self, task_id: &str) -> AppResult<bool> {
        let _guard = self.write_guard()?;
        let schedule = self.latest_schedule()?;
        let known = schedule
            .iter()
            .any(|item| item.is_task() && item.id == task_id);
        if !known {
            return Err(AppError::validation_with_details(
                "unknown task id in current schedule",
                json!({ "taskId": task_id }),
            ));
        }

        let mut completed = self.completed_ids()?;
        let now_completed = if completed.remove(task_id) {
            false
        } else {
            completed.insert(task_id.to_string());
            true
        };
        save_typed(self.store.as_ref(), KEY_COMPLETED_TASKS, &completed)?;

        debug!(target: "app::schedule", task_id, completed = now_completed, "completion toggled");
        Ok(now_completed)
    }

    pub fn progress(&self, now: DateTime<FixedOffset>) -> AppResult<ProgressSummary> {
        let schedule = self.latest_schedule()?;
        let completed: HashSet<String> = self.completed_ids()?.into_iter().collect();
        Ok(compute_progress(&schedule, &completed, now))
    }

    pub fn reset(&self) -> AppResult<()> {
        let _guard = self.write_guard()?;
        self.store.remove(KEY_LATEST_SCHEDULE)?;
        self.store.remove(KEY_COMPLETED_TASKS)?;
        info!(target: "app::schedule", "session reset");
        Ok(())
    }
}
