pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

use tracing::info;

use crate::config::AppConfig;
use crate::error::AppResult;

pub async fn run() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    utils::logger::init_logging(&config.log_dir())?;

    info!(
        target: "app::http",
        data_dir = %config.data_dir.display(),
        ai_configured = config.ai.api_key.is_some(),
        timezone = config.timezone.map(|tz| tz.name()).unwrap_or("local"),
        "starting focusday"
    );

    server::serve(&config).await
}
