pub mod ai;
pub mod break_advice;
pub mod progress;
pub mod schedule;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::db::store::{SqliteStatePort, StatePort};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::ai_service::AiService;
use crate::services::break_advice::BreakAdviceService;
use crate::services::schedule_service::ScheduleService;
use crate::services::session_service::SessionService;

#[derive(Clone)]
pub struct AppState {
    ai_service: Arc<AiService>,
    schedule_service: Arc<ScheduleService>,
    break_advice_service: Arc<BreakAdviceService>,
    session_service: Arc<SessionService>,
}

impl AppState {
    /// Wires services over the SQLite store in the configured data directory.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let ai_service = AiService::new(&config.ai)?;
        let db_pool = DbPool::new(config.database_path())?;
        let store: Arc<dyn StatePort> = Arc::new(SqliteStatePort::new(db_pool));
        Ok(Self::from_parts(ai_service, store, config.timezone))
    }

    pub fn from_parts(ai_service: AiService, store: Arc<dyn StatePort>, timezone: Option<Tz>) -> Self {
        let schedule_service = ScheduleService::new(ai_service.clone(), timezone);
        let break_advice_service = BreakAdviceService::new(ai_service.clone());
        let session_service = SessionService::new(store);

        Self {
            ai_service: Arc::new(ai_service),
            schedule_service: Arc::new(schedule_service),
            break_advice_service: Arc::new(break_advice_service),
            session_service: Arc::new(session_service),
        }
    }

    pub fn ai(&self) -> Arc<AiService> {
        Arc::clone(&self.ai_service)
    }

    pub fn schedules(&self) -> Arc<ScheduleService> {
        Arc::clone(&self.schedule_service)
    }

    pub fn break_advice(&self) -> Arc<BreakAdviceService> {
        Arc::clone(&self.break_advice_service)
    }

    pub fn session(&self) -> Arc<SessionService> {
        Arc::clone(&self.session_service)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

pub const SCHEDULE_FAILED_MESSAGE: &str = "Failed to create schedule";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            error: error.into(),
            details,
        }
    }

    pub fn validation(error: impl Into<String>, details: Option<JsonValue>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", error, details)
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation { message, details } => CommandError::validation(message, details),
            AppError::Scheduling { message } => {
                error!(target: "app::command", %message, "schedule could not be produced");
                CommandError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCHEDULING_FAILED",
                    SCHEDULE_FAILED_MESSAGE,
                    None,
                )
            }
            AppError::Ai {
                code,
                message,
                correlation_id,
                details,
            } => {
                let mut merged = JsonMap::new();
                match details {
                    Some(JsonValue::Object(map)) => merged.extend(map),
                    Some(value) => {
                        merged.insert("info".to_string(), value);
                    }
                    None => {}
                }
                if let Some(id) = correlation_id {
                    merged.insert("correlationId".to_string(), JsonValue::String(id));
                }
                let detail_value = (!merged.is_empty()).then(|| JsonValue::Object(merged));
                CommandError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    code.as_str(),
                    message,
                    detail_value,
                )
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new(StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN", "storage failure", None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new(StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN", "serialization failure", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new(StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN", "file system failure", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new(StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN", message, None)
            }
        }
    }
}

impl From<JsonRejection> for CommandError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(target: "app::command", error = %rejection.body_text(), "rejected request body");
        CommandError::validation(
            "request body is not valid JSON for this endpoint",
            Some(json!({ "reason": rejection.body_text() })),
        )
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
