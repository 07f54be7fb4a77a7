use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use focusday_lib::error::{AiErrorCode, AppError, AppResult};
use focusday_lib::models::ai_types::{AiProviderMetadata, GenerationOptions};
use focusday_lib::models::schedule::{ScheduleItemType, ScheduleRequest, ScheduleSource};
use focusday_lib::models::task::{Task, TaskPriority, TimeSlot};
use focusday_lib::services::ai_service::{AiService, TextGenerator};
use focusday_lib::services::schedule_assembler::find_overlap;
use focusday_lib::services::schedule_service::ScheduleService;

/// Replays one canned answer and counts how often it was asked.
struct FakeGenerator {
    answer: Result<String, AiErrorCode>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    fn text(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(code: AiErrorCode) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(code),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, _prompt: &str, options: GenerationOptions) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(options, GenerationOptions::SCHEDULE);
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(code) => Err(AppError::ai(*code, "fake provider failure")),
        }
    }

    fn metadata(&self) -> AiProviderMetadata {
        AiProviderMetadata {
            provider_id: Some("fake".into()),
            ..AiProviderMetadata::default()
        }
    }
}

fn now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-06-02T07:30:00-04:00").expect("valid now")
}

fn request(tasks: Vec<Task>, start: &str) -> ScheduleRequest {
    ScheduleRequest {
        tasks,
        start_time: Some(start.to_string()),
    }
}

fn service_with(generator: Arc<FakeGenerator>) -> ScheduleService {
    ScheduleService::new(AiService::with_generator(generator), None)
}

#[tokio::test]
async fn prose_answer_falls_back_to_time_slot_schedule() {
    let generator = FakeGenerator::text("Here's a lovely plan: do A first, then B after lunch.");
    let service = service_with(Arc::clone(&generator));

    let outcome = service
        .create_schedule_at(
            &request(
                vec![
                    Task::new("b", "B", 60, TimeSlot::Morning),
                    Task::new("a", "A", 30, TimeSlot::Morning),
                ],
                "09:00",
            ),
            now(),
        )
        .await
        .expect("fallback always produces a schedule");

    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.source, ScheduleSource::Fallback);

    let rendered: Vec<(String, String, String)> = outcome
        .schedule
        .iter()
        .map(|item| {
            (
                item.name.clone(),
                item.start_time.format("%H:%M").to_string(),
                item.end_time.format("%H:%M").to_string(),
            )
        })
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("A".into(), "09:00".into(), "09:30".into()),
            ("Break".into(), "09:30".into(), "09:40".into()),
            ("B".into(), "09:45".into(), "10:45".into()),
        ]
    );
    assert_eq!(outcome.schedule[0].start_time.to_rfc3339(), "2025-06-02T09:00:00-04:00");
    assert!(find_overlap(&outcome.schedule).is_none());
}

#[tokio::test]
async fn valid_ai_schedule_is_returned_sorted() {
    let generator = FakeGenerator::text(
        r#"Sure! [
            {"id":"task_2","name":"Yoga","duration":30,"type":"task","originalTaskId":"y","scheduledTime":"19:00"},
            {"id":"task_1","name":"Emails","duration":20,"type":"task","originalTaskId":"e","scheduledTime":"8:15"},
            {"id":"break_1","name":"Break","duration":10,"type":"break","scheduledTime":"08:35"}
        ] Enjoy your day."#,
    );
    let service = service_with(generator);

    let outcome = service
        .create_schedule_at(
            &request(
                vec![
                    Task::new("e", "Emails", 20, TimeSlot::Morning),
                    Task::new("y", "Yoga", 30, TimeSlot::Evening),
                ],
                "08:00",
            ),
            now(),
        )
        .await
        .expect("schedule");

    assert_eq!(outcome.source, ScheduleSource::Ai);
    let ids: Vec<&str> = outcome.schedule.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["task_1", "break_1", "task_2"]);
    assert_eq!(outcome.schedule[1].item_type, ScheduleItemType::Break);
}

#[tokio::test]
async fn ai_schedule_dropping_a_task_is_rejected() {
    let generator = FakeGenerator::text(
        r#"[{"name":"Emails","duration":20,"type":"task","originalTaskId":"e","scheduledTime":"08:00"}]"#,
    );
    let service = service_with(generator);

    let outcome = service
        .create_schedule_at(
            &request(
                vec![
                    Task::new("e", "Emails", 20, TimeSlot::Morning),
                    Task::new("y", "Yoga", 30, TimeSlot::Evening),
                ],
                "08:00",
            ),
            now(),
        )
        .await
        .expect("schedule");

    assert_eq!(outcome.source, ScheduleSource::Fallback);
    let task_ids: Vec<&str> = outcome
        .schedule
        .iter()
        .filter(|item| item.is_task())
        .filter_map(|item| item.original_task_id.as_deref())
        .collect();
    assert_eq!(task_ids, vec!["e", "y"]);
}

#[tokio::test]
async fn unavailable_provider_falls_back_silently() {
    for code in [
        AiErrorCode::MissingApiKey,
        AiErrorCode::HttpTimeout,
        AiErrorCode::RateLimited,
        AiErrorCode::ProviderUnavailable,
    ] {
        let service = service_with(FakeGenerator::failing(code));
        let outcome = service
            .create_schedule_at(
                &request(vec![Task::new("r", "Read", 40, TimeSlot::Evening)], "17:10"),
                now(),
            )
            .await
            .expect("schedule");

        assert_eq!(outcome.source, ScheduleSource::Fallback);
        assert_eq!(outcome.schedule.len(), 1);
        assert_eq!(outcome.schedule[0].start_time.format("%H:%M").to_string(), "18:00");
    }
}

#[tokio::test]
async fn no_api_key_uses_planner_and_drops_elapsed_slots() {
    let service = ScheduleService::new(AiService::disabled(), None);

    let outcome = service
        .create_schedule_at(
            &request(
                vec![
                    Task::new("m", "Run", 30, TimeSlot::Morning),
                    Task::new("e", "Journal", 20, TimeSlot::Evening),
                ],
                "13:00",
            ),
            now(),
        )
        .await
        .expect("schedule");

    assert_eq!(outcome.schedule.len(), 1);
    assert_eq!(outcome.schedule[0].original_task_id.as_deref(), Some("e"));
}

#[tokio::test]
async fn priority_breaks_duration_ties() {
    let service = ScheduleService::new(AiService::disabled(), None);

    let outcome = service
        .create_schedule_at(
            &request(
                vec![
                    Task::new("low", "Low", 30, TimeSlot::Afternoon).with_priority(TaskPriority::Low),
                    Task::new("high", "High", 30, TimeSlot::Afternoon).with_priority(TaskPriority::High),
                ],
                "12:00",
            ),
            now(),
        )
        .await
        .expect("schedule");

    assert_eq!(outcome.schedule[0].id, "high");
    assert_eq!(outcome.schedule[2].id, "low");
}

#[tokio::test]
async fn invalid_requests_surface_as_validation_errors() {
    let service = ScheduleService::new(AiService::disabled(), None);

    let cases = vec![
        request(vec![], "09:00"),
        request(vec![Task::new("a", "A", 30, TimeSlot::Morning)], "24:00"),
        request(vec![Task::new("a", "A", 30, TimeSlot::Morning)], "9:00"),
        request(vec![Task::new("a", "A", 3, TimeSlot::Morning)], "09:00"),
        request(vec![Task::new("a", "   ", 30, TimeSlot::Morning)], "09:00"),
        ScheduleRequest {
            tasks: vec![Task::new("a", "A", 30, TimeSlot::Morning)],
            start_time: None,
        },
    ];

    for case in cases {
        let error = service
            .create_schedule_at(&case, now())
            .await
            .expect_err("invalid request");
        assert!(matches!(error, AppError::Validation { .. }), "{error}");
    }
}

#[tokio::test]
async fn ai_items_off_the_day_or_outside_their_slot_fall_back() {
    let tasks = || {
        vec![
            Task::new("a", "A", 30, TimeSlot::Morning),
            Task::new("b", "B", 30, TimeSlot::Evening),
        ]
    };
    let answers = [
        // hour past the end of the day
        r#"[{"name":"A","duration":30,"type":"task","originalTaskId":"a","scheduledTime":"99:00"},
            {"name":"B","duration":30,"type":"task","originalTaskId":"b","scheduledTime":"18:00"}]"#,
        // before the requested start
        r#"[{"name":"A","duration":30,"type":"task","originalTaskId":"a","scheduledTime":"09:30"},
            {"name":"B","duration":30,"type":"task","originalTaskId":"b","scheduledTime":"03:00"}]"#,
        // evening task placed in the afternoon
        r#"[{"name":"A","duration":30,"type":"task","originalTaskId":"a","scheduledTime":"09:30"},
            {"name":"B","duration":30,"type":"task","originalTaskId":"b","scheduledTime":"14:00"}]"#,
    ];

    for answer in answers {
        let service = service_with(FakeGenerator::text(answer));
        let outcome = service
            .create_schedule_at(&request(tasks(), "09:00"), now())
            .await
            .expect("schedule");

        assert_eq!(outcome.source, ScheduleSource::Fallback, "{answer}");
        let starts: Vec<String> = outcome
            .schedule
            .iter()
            .map(|item| item.start_time.to_rfc3339())
            .collect();
        assert_eq!(
            starts,
            vec!["2025-06-02T09:00:00-04:00", "2025-06-02T18:00:00-04:00"]
        );
    }
}

#[tokio::test]
async fn spring_forward_day_keeps_local_slot_hours() {
    let service = ScheduleService::new(AiService::disabled(), Some(chrono_tz::America::New_York));
    let before_jump = DateTime::parse_from_rfc3339("2025-03-09T01:30:00-05:00").expect("valid now");

    let outcome = service
        .create_schedule_at(
            &request(
                vec![
                    Task::new("m", "Run", 30, TimeSlot::Morning),
                    Task::new("e", "Journal", 20, TimeSlot::Evening),
                ],
                "09:00",
            ),
            before_jump,
        )
        .await
        .expect("schedule");

    assert_eq!(outcome.schedule[0].start_time.to_rfc3339(), "2025-03-09T09:00:00-04:00");
    assert_eq!(outcome.schedule[0].end_time.to_rfc3339(), "2025-03-09T09:30:00-04:00");
    assert_eq!(outcome.schedule[1].start_time.to_rfc3339(), "2025-03-09T18:00:00-04:00");
}
