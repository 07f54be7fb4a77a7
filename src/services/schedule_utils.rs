use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::error::{AppError, AppResult};

const MINUTES_PER_DAY: u32 = 24 * 60;

static STRICT_CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})$").expect("static clock pattern"));
static LENIENT_CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("static clock pattern"));

/// Parse a user-supplied `HH:MM` (hours 0-23, minutes 0-59).
pub fn parse_clock(value: &str) -> AppResult<(u32, u32)> {
    let invalid = || {
        AppError::validation_with_details(
            "start time must be HH:MM (00:00-23:59)",
            json!({ "value": value }),
        )
    };

    let captures = STRICT_CLOCK.captures(value.trim()).ok_or_else(invalid)?;
    let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
    let minute: u32 = captures[2].parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Whether `value` is a same-day `H:MM`/`HH:MM` (hours 0-23). AI answers are
/// held to this; only planner overflow may run past midnight.
pub fn is_clock_like(value: &str) -> bool {
    matches!(parse_clock_minutes(value), Ok(minutes) if minutes < MINUTES_PER_DAY)
}

/// Minutes after midnight for `H:MM`/`HH:MM`. Hours past 23 are accepted and
/// land on the following day, which is where overflowing evening items go.
pub fn parse_clock_minutes(value: &str) -> AppResult<u32> {
    let invalid = || {
        AppError::validation_with_details("invalid scheduled time", json!({ "value": value }))
    };

    let captures = LENIENT_CLOCK.captures(value.trim()).ok_or_else(invalid)?;
    let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
    let minute: u32 = captures[2].parse().map_err(|_| invalid())?;
    if minute > 59 {
        return Err(invalid());
    }
    Ok(hour * 60 + minute)
}

/// `HH:MM` for a minute-of-day cursor; the hour is not wrapped at 24.
pub fn format_clock(total_minutes: u32) -> String {
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

pub fn add_minutes(dt: DateTime<FixedOffset>, minutes: i64) -> AppResult<DateTime<FixedOffset>> {
    dt.checked_add_signed(Duration::minutes(minutes))
        .ok_or_else(|| AppError::validation("time arithmetic out of range"))
}

/// Whether half-open intervals `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub fn overlaps(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// `minutes` after midnight of `date` as a wall-clock time in `timezone`, or
/// in the fixed `offset` when no zone is configured. Minutes past the end of
/// the day roll into the next one.
///
/// A time skipped by a forward transition is read with the offset in force
/// before it (02:30 on a spring-forward night becomes 03:30). A repeated time
/// resolves to its first occurrence.
pub fn resolve_wall_clock(
    date: NaiveDate,
    minutes: u32,
    timezone: Option<Tz>,
    offset: FixedOffset,
) -> AppResult<DateTime<FixedOffset>> {
    let naive = date
        .and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::minutes(i64::from(minutes)))
        .ok_or_else(|| AppError::validation("clock time out of range"))?;

    match timezone {
        Some(tz) => resolve_in(&tz, naive),
        None => resolve_in(&offset, naive),
    }
}

fn resolve_in<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> AppResult<DateTime<FixedOffset>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(resolved) => Ok(resolved.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
        LocalResult::None => {
            let unresolvable = || AppError::validation("clock time cannot be resolved in zone");
            let before_gap = naive
                .checked_sub_signed(Duration::hours(3))
                .and_then(|earlier| zone.from_local_datetime(&earlier).earliest())
                .ok_or_else(unresolvable)?;
            let offset_seconds = before_gap.offset().fix().local_minus_utc();
            let utc = naive
                .checked_sub_signed(Duration::seconds(i64::from(offset_seconds)))
                .ok_or_else(unresolvable)?;
            Ok(zone.from_utc_datetime(&utc).fixed_offset())
        }
    }
}

/// Current wall-clock time in the configured zone, or the host zone.
pub fn local_now(timezone: Option<Tz>) -> DateTime<FixedOffset> {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).fixed_offset(),
        None => Local::now().fixed_offset(),
    }
}
