use std::collections::BTreeMap;

use chrono::Timelike;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::models::ai_types::BreakAdviceRequest;
use crate::models::schedule::ScheduledTask;
use crate::models::task::TimeSlot;
use crate::services::ai_service::AiService;

const SCREEN_BREAK_ADVICE: &str = "Great job! Step away from the screen and do some gentle neck rolls and shoulder stretches. Grab some water and take 5 deep breaths to reset your focus.";
const REST_AND_ADMIRE_ADVICE: &str = "Nice work! Sit down for a moment and enjoy the organized space you created. Have a healthy snack and appreciate your accomplishment.";
const MOVEMENT_ADVICE: &str = "Well done! Give your brain a break by doing something physical - try 10 jumping jacks or a quick walk around the room to get your blood flowing.";
pub const GENERIC_ADVICE: &str = "Excellent work! Take a moment to celebrate completing that task. Stretch, hydrate, and do something that makes you feel good before moving on.";

/// Upper bound on break-advice calls in flight for one schedule.
pub const MAX_CONCURRENT_ADVICE: usize = 4;

/// Keyword groups checked in order against the lowercased task name.
const KEYWORD_ADVICE: [(&[&str], &str); 3] = [
    (&["computer", "write", "email"], SCREEN_BREAK_ADVICE),
    (&["clean", "organize"], REST_AND_ADMIRE_ADVICE),
    (&["study", "read"], MOVEMENT_ADVICE),
];

/// Local advice for when the AI collaborator is unavailable. Never empty.
pub fn fallback_advice(task_name: &str) -> &'static str {
    let name = task_name.to_lowercase();
    KEYWORD_ADVICE
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| name.contains(keyword)))
        .map(|(_, advice)| *advice)
        .unwrap_or(GENERIC_ADVICE)
}

#[derive(Clone)]
pub struct BreakAdviceService {
    ai: AiService,
}

impl BreakAdviceService {
    pub fn new(ai: AiService) -> Self {
        Self { ai }
    }

    /// AI advice for a finished task, or the keyword fallback. Never fails.
    pub async fn advise(&self, request: &BreakAdviceRequest) -> String {
        let task_name = request.task_name.trim();
        if task_name.is_empty() {
            return GENERIC_ADVICE.to_string();
        }

        match self.ai.break_advice(request).await {
            Ok(advice) if !advice.is_empty() => advice,
            Ok(_) => {
                debug!(target: "app::ai", task_name, "AI returned blank advice; using fallback");
                fallback_advice(task_name).to_string()
            }
            Err(error) => {
                debug!(
                    target: "app::ai",
                    task_name,
                    error = %error,
                    "break advice unavailable; using fallback"
                );
                fallback_advice(task_name).to_string()
            }
        }
    }

    /// Advice for every break that directly follows a task, keyed by break id.
    ///
    /// At most [`MAX_CONCURRENT_ADVICE`] requests run at once, and each break
    /// falls back on its own.
    pub async fn advise_for_schedule(&self, schedule: &[ScheduledTask]) -> BTreeMap<String, String> {
        let requests = break_advice_requests(schedule);
        if requests.is_empty() {
            return BTreeMap::new();
        }

        debug!(target: "app::ai", breaks = requests.len(), "requesting break advice batch");

        let pending: Vec<_> = requests.iter().map(|(_, request)| self.advise(request)).collect();
        let answers: Vec<String> =
            stream::iter(pending)
                .buffered(MAX_CONCURRENT_ADVICE)
                .collect()
                .await;

        requests
            .into_iter()
            .zip(answers)
            .map(|((break_id, _), advice)| (break_id, advice))
            .collect()
    }
}

/// Pairs each qualifying break id with the request describing the task before it.
pub fn break_advice_requests(schedule: &[ScheduledTask]) -> Vec<(String, BreakAdviceRequest)> {
    schedule
        .windows(2)
        .filter(|pair| pair[0].is_task() && pair[1].is_break())
        .map(|pair| {
            let (task, rest) = (&pair[0], &pair[1]);
            let time_of_day = TimeSlot::classify_hour(task.start_time.hour());
            (
                rest.id.clone(),
                BreakAdviceRequest {
                    task_name: task.name.clone(),
                    task_duration: Some(task.duration),
                    time_of_day: Some(time_of_day.as_str().to_string()),
                },
            )
        })
        .collect()
}
