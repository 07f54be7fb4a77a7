use chrono::{DateTime, FixedOffset};

use crate::models::ai_types::BreakAdviceRequest;
use crate::models::task::{Task, TimeSlot};

fn slot_window_line(slot: TimeSlot) -> String {
    let window = slot.window();
    format!(
        "   - {} tasks: {:02}:00 - {:02}:00",
        capitalize(slot.as_str()),
        window.start_hour,
        window.end_hour
    )
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One line per task: name, duration, priority and preferred slot.
pub fn describe_tasks(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(|task| {
            format!(
                "- {} (id: {}, {} minutes, {} priority, prefers {})",
                task.name,
                task.id,
                task.estimated_duration,
                task.priority.as_str(),
                task.preferred_time_slot.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking for an ADHD-friendly schedule as a bare JSON array.
pub fn build_schedule_prompt(tasks: &[Task], start: DateTime<FixedOffset>) -> String {
    let windows = TimeSlot::ALL
        .iter()
        .map(|slot| slot_window_line(*slot))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an assistant that builds ADHD-friendly daily schedules. Schedule the following tasks.

TASKS:
{tasks}

SCHEDULING RULES:
1. Place every task inside its PREFERRED TIME SLOT:
{windows}
2. Never schedule a task outside its preferred window.
3. Within a time slot, insert a 10-15 minute break between consecutive tasks.
4. Leave buffer time between different kinds of activities; do not pack tasks tightly.
5. Shorter tasks may sit closer together; longer tasks need more recovery time.
6. Nothing may start earlier than {start} and no two items may overlap.
7. Schedule every task exactly once and reference it through "originalTaskId".

Respond with ONLY a JSON array in exactly this shape, with no explanation and no markdown:
[
  {{"id": "task_1", "name": "Task Name", "duration": 30, "type": "task", "originalTaskId": "<task id>", "scheduledTime": "09:30"}},
  {{"id": "break_1", "name": "Break", "duration": 10, "type": "break", "scheduledTime": "10:00"}}
]
"scheduledTime" is a 24-hour HH:MM wall-clock time on {day}."#,
        tasks = describe_tasks(tasks),
        windows = windows,
        start = start.format("%H:%M"),
        day = start.format("%Y-%m-%d"),
    )
}

/// Prompt asking for a short, concrete break suggestion.
pub fn build_break_advice_prompt(request: &BreakAdviceRequest) -> String {
    let duration = request
        .task_duration
        .map(|minutes| format!(" which took {minutes} minutes"))
        .unwrap_or_default();
    let time_of_day = request
        .time_of_day
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| format!(" during the {value}"))
        .unwrap_or_default();

    format!(
        r#"You are an ADHD-friendly wellness coach. Someone just finished "{name}"{duration}{time_of_day}.

Recommend a break that accounts for:
1. the mental and physical demands of the task they finished
2. the time of day and likely energy level
3. ADHD needs such as movement, dopamine and a sensory reset
4. the transition back into the next task

Give 2-3 specific activities that take 5-15 minutes, in 1-2 encouraging sentences. Reply with the advice text only."#,
        name = request.task_name.trim(),
    )
}
