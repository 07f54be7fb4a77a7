use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::commands::{ai, break_advice, progress, schedule, AppState};
use crate::config::AppConfig;
use crate::error::AppResult;

fn task_scheduler_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schedule",
            post(schedule::create_schedule)
                .get(schedule::latest_schedule)
                .delete(schedule::reset_schedule),
        )
        .route("/break-advice", post(break_advice::break_advice))
        .route("/break-advice/batch", post(break_advice::break_advice_batch))
        .route("/completions/:task_id", post(progress::toggle_completion))
        .route("/progress", get(progress::progress))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/task-scheduler", task_scheduler_routes())
        .route("/api/ai/status", get(ai::ai_status))
        .route("/health", get(ai::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until ctrl-c.
pub async fn serve(config: &AppConfig) -> AppResult<()> {
    let state = AppState::new(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    info!(target: "app::http", address = %config.bind_address, "focusday listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(target: "app::http", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}
