use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use focusday_lib::db::store::{load_typed, save_typed, SqliteStatePort, StatePort};
use focusday_lib::db::DbPool;
use focusday_lib::models::schedule::{ScheduleItemType, ScheduledTask};
use focusday_lib::services::session_service::SessionService;
use serde_json::json;
use tempfile::tempdir;

fn at(clock: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(&format!("2025-05-01T{clock}:00+09:00")).expect("valid time")
}

fn item(id: &str, kind: ScheduleItemType, start: &str, duration: u32) -> ScheduledTask {
    ScheduledTask {
        id: id.to_string(),
        name: id.to_string(),
        duration,
        start_time: at(start),
        end_time: at(start) + Duration::minutes(i64::from(duration)),
        item_type: kind,
        original_task_id: (kind == ScheduleItemType::Task).then(|| id.to_string()),
    }
}

#[test]
fn sqlite_port_persists_across_pools() {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("focusday.sqlite");

    {
        let port = SqliteStatePort::new(DbPool::new(&db_path).expect("db pool"));
        port.save("prefs", &json!({ "startTime": "08:30" })).expect("save");
        port.save("prefs", &json!({ "startTime": "09:00" })).expect("overwrite");
    }

    let port = SqliteStatePort::new(DbPool::new(&db_path).expect("reopen pool"));
    assert_eq!(
        port.load("prefs").expect("load"),
        Some(json!({ "startTime": "09:00" }))
    );
    assert!(port.remove("prefs").expect("remove"));
    assert!(port.load("prefs").expect("load after remove").is_none());
}

#[test]
fn typed_helpers_work_through_sqlite() {
    let dir = tempdir().expect("temp dir");
    let port = SqliteStatePort::new(DbPool::new(dir.path().join("kv.sqlite")).expect("db pool"));

    let schedule = vec![item("a", ScheduleItemType::Task, "09:00", 30)];
    save_typed(&port, "schedule", &schedule).expect("save typed");
    let loaded: Option<Vec<ScheduledTask>> = load_typed(&port, "schedule").expect("load typed");

    let loaded = loaded.expect("schedule stored");
    assert_eq!(loaded, schedule);
    assert_eq!(loaded[0].start_time.to_rfc3339(), "2025-05-01T09:00:00+09:00");
}

#[test]
fn session_round_trip_on_disk() {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("session.sqlite");
    let store: Arc<dyn StatePort> =
        Arc::new(SqliteStatePort::new(DbPool::new(&db_path).expect("db pool")));
    let session = SessionService::new(Arc::clone(&store));

    session
        .record_schedule(&[
            item("a", ScheduleItemType::Task, "09:00", 30),
            item("rest", ScheduleItemType::Break, "09:30", 10),
            item("b", ScheduleItemType::Task, "09:45", 60),
        ])
        .expect("record");

    assert!(session.toggle_completion("b").expect("toggle"));

    // a fresh service over the same file sees the same state
    let reopened = SessionService::new(Arc::new(SqliteStatePort::new(
        DbPool::new(&db_path).expect("reopen"),
    )));
    let progress = reopened.progress(at("09:50")).expect("progress");
    assert_eq!(progress.total_tasks, 2);
    assert_eq!(progress.completed_tasks, 1);
    assert_eq!(progress.percentage, 50.0);
    assert_eq!(progress.total_minutes, 90);
    assert_eq!(progress.completed_minutes, 60);
    assert_eq!(progress.current_item_id.as_deref(), Some("b"));

    reopened.reset().expect("reset");
    assert!(session.latest_schedule().expect("latest").is_empty());
}
