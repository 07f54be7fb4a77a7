use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use rand::Rng;

use crate::error::AppResult;
use crate::models::schedule::{RawScheduleItem, ScheduleItemType, ScheduledTask};
use crate::services::schedule_utils::{add_minutes, overlaps, parse_clock_minutes, resolve_wall_clock};

/// Pins raw schedule items to the request's calendar day.
pub struct ScheduleAssembler;

impl ScheduleAssembler {
    /// Converts `items` into dated records sorted by start time.
    ///
    /// `scheduledTime` is a wall-clock time on `start`'s day, read in
    /// `timezone` (or `start`'s offset when unset); an item without one
    /// starts at `start`. Ids that are missing or repeated are
    /// replaced with generated ones. The sort is stable, so items sharing a
    /// start time keep their upstream order.
    pub fn assemble(
        items: &[RawScheduleItem],
        start: DateTime<FixedOffset>,
        timezone: Option<Tz>,
    ) -> AppResult<Vec<ScheduledTask>> {
        let day = start.date_naive();
        let mut seen_ids = HashSet::with_capacity(items.len());
        let mut schedule = Vec::with_capacity(items.len());

        for item in items {
            let start_time = match item.scheduled_time.as_deref() {
                Some(clock) => {
                    resolve_wall_clock(day, parse_clock_minutes(clock)?, timezone, *start.offset())?
                }
                None => start,
            };
            let end_time = add_minutes(start_time, i64::from(item.duration))?;
            let end_time = match timezone {
                Some(tz) => end_time.with_timezone(&tz).fixed_offset(),
                None => end_time,
            };

            let id = match item.id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() && !seen_ids.contains(id) => id.to_string(),
                _ => generate_item_id(item.item_type),
            };
            seen_ids.insert(id.clone());

            schedule.push(ScheduledTask {
                id,
                name: item.name.clone(),
                duration: item.duration,
                start_time,
                end_time,
                item_type: item.item_type,
                original_task_id: item.original_task_id.clone(),
            });
        }

        schedule.sort_by_key(|item| item.start_time);
        Ok(schedule)
    }
}

/// `type_timestamp_random` id for items that arrive without one.
pub fn generate_item_id(item_type: ScheduleItemType) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!(
        "{}_{}_{:08x}",
        item_type.as_str(),
        Utc::now().timestamp_millis(),
        suffix
    )
}

/// First pair of overlapping items in a start-sorted schedule, by id.
pub fn find_overlap(schedule: &[ScheduledTask]) -> Option<(&str, &str)> {
    let mut latest: Option<&ScheduledTask> = None;

    for item in schedule {
        if let Some(previous) = latest {
            let non_empty = item.end_time > item.start_time;
            if non_empty
                && overlaps(previous.start_time, previous.end_time, item.start_time, item.end_time)
            {
                return Some((previous.id.as_str(), item.id.as_str()));
            }
            if item.end_time > previous.end_time {
                latest = Some(item);
            }
        } else if item.end_time > item.start_time {
            latest = Some(item);
        }
    }

    None
}
