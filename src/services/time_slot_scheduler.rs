//! Deterministic time-slot scheduler.
//!
//! Each preferred time slot is scheduled on its own: tasks are placed
//! shortest-first from the slot's effective start, with a break after every
//! task but the last and a fixed buffer before the next one. This is the
//! fallback whenever the AI path fails, and its output shape is the contract
//! the AI path must meet as well.
//!
//! Known looseness, kept on purpose:
//! - a slot whose window has already passed at the start time produces
//!   nothing (no roll-over to a later slot or to tomorrow);
//! - tasks are not clipped at the window end, so a crowded slot can spill
//!   into the next slot's hours and nothing reconciles the two.

use chrono::{DateTime, FixedOffset, Timelike};
use tracing::debug;

use crate::models::schedule::RawScheduleItem;
use crate::models::task::{SlotWindow, Task, TimeSlot};
use crate::services::schedule_utils::format_clock;

/// Gap between consecutive tasks in a slot, on top of any break.
pub const BUFFER_MINUTES: u32 = 5;
pub const SHORT_BREAK_MINUTES: u32 = 10;
pub const LONG_BREAK_MINUTES: u32 = 15;
/// Tasks at least this long earn the long break.
pub const LONG_TASK_THRESHOLD_MINUTES: u32 = 60;

pub struct TimeSlotScheduler;

impl TimeSlotScheduler {
    /// Builds the raw schedule for `tasks` starting no earlier than `start`.
    ///
    /// Total for any input. Items come out grouped by slot in
    /// morning, afternoon, evening order.
    pub fn schedule(tasks: &[Task], start: DateTime<FixedOffset>) -> Vec<RawScheduleItem> {
        let mut items = Vec::with_capacity(tasks.len() * 2);

        for slot in TimeSlot::ALL {
            let bucket: Vec<&Task> = tasks
                .iter()
                .filter(|task| task.preferred_time_slot == slot)
                .collect();
            items.extend(Self::schedule_slot(slot, bucket, start));
        }

        items
    }

    fn schedule_slot(
        slot: TimeSlot,
        mut bucket: Vec<&Task>,
        start: DateTime<FixedOffset>,
    ) -> Vec<RawScheduleItem> {
        if bucket.is_empty() {
            return Vec::new();
        }

        let window = slot.window();
        let Some(mut cursor) = effective_cursor(window, start) else {
            debug!(
                target: "app::schedule",
                slot = slot.as_str(),
                dropped = bucket.len(),
                "slot window already elapsed; skipping its tasks"
            );
            return Vec::new();
        };

        // shortest first; stable, so equal durations keep their incoming order
        bucket.sort_by_key(|task| task.estimated_duration);

        let last = bucket.len() - 1;
        let mut items = Vec::with_capacity(bucket.len() * 2);

        for (index, task) in bucket.into_iter().enumerate() {
            items.push(RawScheduleItem::task(task, format_clock(cursor)));
            cursor += task.estimated_duration;

            if index == last {
                break;
            }

            if cursor / 60 < window.end_hour {
                let rest = break_minutes(task.estimated_duration);
                items.push(RawScheduleItem::rest(
                    format!("break_{}_{}", slot.as_str(), index),
                    rest,
                    format_clock(cursor),
                ));
                cursor += rest;
            }

            cursor += BUFFER_MINUTES;
        }

        items
    }
}

/// First minute-of-day a slot may use given `start`, or `None` when the
/// slot's window has already closed.
pub fn effective_cursor(window: SlotWindow, start: DateTime<FixedOffset>) -> Option<u32> {
    let start_hour = start.hour();
    let hour = window.start_hour.max(start_hour);
    let minute = if hour == start_hour { start.minute() } else { 0 };

    if hour >= window.end_hour {
        None
    } else {
        Some(hour * 60 + minute)
    }
}

pub fn break_minutes(finished_task_minutes: u32) -> u32 {
    if finished_task_minutes >= LONG_TASK_THRESHOLD_MINUTES {
        LONG_BREAK_MINUTES
    } else {
        SHORT_BREAK_MINUTES
    }
}
