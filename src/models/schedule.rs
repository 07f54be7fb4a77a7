use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleItemType {
    Task,
    Break,
}

impl ScheduleItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleItemType::Task => "task",
            ScheduleItemType::Break => "break",
        }
    }
}

/// Slot-relative schedule entry produced by the AI interpreter or the
/// deterministic scheduler, before it is pinned to a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduleItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Minutes.
    pub duration: u32,
    #[serde(rename = "type")]
    pub item_type: ScheduleItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_task_id: Option<String>,
    /// `HH:MM` wall-clock start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
}

impl RawScheduleItem {
    pub fn task(task: &Task, scheduled_time: impl Into<String>) -> Self {
        Self {
            id: Some(task.id.clone()),
            name: task.name.clone(),
            duration: task.estimated_duration,
            item_type: ScheduleItemType::Task,
            original_task_id: Some(task.id.clone()),
            scheduled_time: Some(scheduled_time.into()),
        }
    }

    pub fn rest(id: impl Into<String>, duration: u32, scheduled_time: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: "Break".to_string(),
            duration,
            item_type: ScheduleItemType::Break,
            original_task_id: None,
            scheduled_time: Some(scheduled_time.into()),
        }
    }
}

/// Fully dated schedule entry handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub id: String,
    pub name: String,
    pub duration: u32,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    #[serde(rename = "type")]
    pub item_type: ScheduleItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_task_id: Option<String>,
}

impl ScheduledTask {
    pub fn is_task(&self) -> bool {
        self.item_type == ScheduleItemType::Task
    }

    pub fn is_break(&self) -> bool {
        self.item_type == ScheduleItemType::Break
    }

    /// Whether `at` falls inside `[start_time, end_time]`.
    pub fn is_active_at(&self, at: DateTime<FixedOffset>) -> bool {
        at >= self.start_time && at <= self.end_time
    }
}

/// Canonical request after validation: a defensive copy of the tasks and a
/// concrete start timestamp on the reference day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub tasks: Vec<Task>,
    pub start_date_time: DateTime<FixedOffset>,
    /// Zone that schedule clock times are read in; `None` keeps the start's offset.
    pub timezone: Option<Tz>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule: Vec<ScheduledTask>,
}

/// Which path produced a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub schedule: Vec<ScheduledTask>,
    pub source: ScheduleSource,
    pub generated_at: DateTime<FixedOffset>,
}
