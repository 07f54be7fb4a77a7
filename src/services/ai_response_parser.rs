//! Turns untrusted model text into raw schedule items.
//!
//! Nothing from the model is trusted structurally: the array is located in the
//! text, parsed as plain JSON, and each element is checked field by field.
//! Every failure is an `InvalidResponse` AI error, which sends the caller to
//! the deterministic scheduler.

use std::collections::{HashMap, HashSet};

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::schedule::{RawScheduleItem, ScheduleItemType};
use crate::models::task::Task;
use crate::services::schedule_utils::is_clock_like;

/// Upper bound on a single item's duration; anything longer is not a daily plan.
const MAX_ITEM_MINUTES: u64 = 24 * 60;

/// Strips a surrounding markdown fence and returns the first balanced
/// `[...]` span, ignoring brackets inside string literals.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let body = strip_code_fence(text.trim());
    let begin = body.find('[')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in body[begin..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&body[begin..begin + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }

    let without_prefix = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    without_prefix
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_prefix)
        .trim()
}

/// Parses model output into schedule items, rejecting anything off-schema.
pub fn parse_schedule_items(text: &str) -> AppResult<Vec<RawScheduleItem>> {
    let json_text = extract_json_array(text)
        .ok_or_else(|| AppError::ai_parse("AI response does not contain a JSON array"))?;

    let value: JsonValue = serde_json::from_str(json_text)
        .map_err(|err| AppError::ai_parse(format!("AI response is not valid JSON: {err}")))?;

    let elements = value
        .as_array()
        .ok_or_else(|| AppError::ai_parse("AI response is not an array"))?;

    let items = elements
        .iter()
        .enumerate()
        .map(|(index, element)| parse_item(index, element))
        .collect::<AppResult<Vec<_>>>()?;

    debug!(target: "app::ai", item_count = items.len(), "parsed AI schedule items");
    Ok(items)
}

fn parse_item(index: usize, element: &JsonValue) -> AppResult<RawScheduleItem> {
    let object = element
        .as_object()
        .ok_or_else(|| AppError::ai_parse(format!("item {index} is not an object")))?;

    let name = object
        .get("name")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::ai_parse(format!("item {index} has no name")))?
        .to_string();

    let duration = object
        .get("duration")
        .and_then(JsonValue::as_u64)
        .filter(|minutes| (1..=MAX_ITEM_MINUTES).contains(minutes))
        .ok_or_else(|| AppError::ai_parse(format!("item {index} has no valid duration")))?;

    let item_type = match object.get("type").and_then(JsonValue::as_str) {
        Some("task") => ScheduleItemType::Task,
        Some("break") => ScheduleItemType::Break,
        _ => return Err(AppError::ai_parse(format!("item {index} has no valid type"))),
    };

    let id = optional_string(object, "id", index)?;
    let mut original_task_id = optional_string(object, "originalTaskId", index)?;
    let scheduled_time = optional_string(object, "scheduledTime", index)?;

    if let Some(clock) = &scheduled_time {
        if !is_clock_like(clock) {
            return Err(AppError::ai_parse(format!(
                "item {index} has malformed scheduledTime '{clock}'"
            )));
        }
    }

    if item_type == ScheduleItemType::Break && original_task_id.take().is_some() {
        debug!(target: "app::ai", index, "dropped originalTaskId from break item");
    }

    Ok(RawScheduleItem {
        id,
        name,
        duration: duration as u32,
        item_type,
        original_task_id,
        scheduled_time,
    })
}

fn optional_string(
    object: &JsonMap<String, JsonValue>,
    field: &str,
    index: usize,
) -> AppResult<Option<String>> {
    match object.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(value)) if value.trim().is_empty() => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value.trim().to_string())),
        Some(_) => Err(AppError::ai_parse(format!(
            "item {index} field '{field}' must be a string"
        ))),
    }
}

/// Every input task is referenced by exactly one `task` item, and every
/// `task` item references an input task.
pub fn validate_task_coverage(items: &[RawScheduleItem], tasks: &[Task]) -> AppResult<()> {
    let known: HashSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
    let mut references: HashMap<&str, usize> = HashMap::with_capacity(tasks.len());

    for item in items.iter().filter(|item| item.item_type == ScheduleItemType::Task) {
        let reference = item.original_task_id.as_deref().ok_or_else(|| {
            AppError::ai_parse(format!("task item '{}' has no originalTaskId", item.name))
        })?;
        if !known.contains(reference) {
            return Err(AppError::ai_parse(format!(
                "task item '{}' references unknown task '{reference}'",
                item.name
            )));
        }
        *references.entry(reference).or_default() += 1;
    }

    for task in tasks {
        match references.get(task.id.as_str()).copied() {
            Some(1) => {}
            Some(count) => {
                return Err(AppError::ai_parse(format!(
                    "task '{}' scheduled {count} times",
                    task.id
                )))
            }
            None => {
                return Err(AppError::ai_parse(format!(
                    "task '{}' missing from AI schedule",
                    task.id
                )))
            }
        }
    }

    Ok(())
}
