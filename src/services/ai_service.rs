use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AiConfig;
use crate::error::{AiErrorCode, AppError, AppResult};
use crate::models::ai_types::{
    AiProviderMetadata, AiStatusDto, BreakAdviceRequest, GenerationOptions,
};
use crate::models::schedule::RawScheduleItem;
use crate::models::task::Task;
use crate::services::ai_response_parser::parse_schedule_items;
use crate::services::prompt_templates::{build_break_advice_prompt, build_schedule_prompt};

const MISSING_KEY_MESSAGE: &str = "AI API key is not configured";

/// Opaque text completion: a prompt in, untrusted text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> AppResult<String>;

    fn metadata(&self) -> AiProviderMetadata;
}

#[derive(Clone)]
pub struct AiService {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AiService {
    /// Builds the DeepSeek-backed service; without an API key there is no
    /// generator and every call fails fast with `MissingApiKey`.
    pub fn new(config: &AiConfig) -> AppResult<Self> {
        let generator = match &config.api_key {
            Some(api_key) => {
                let provider = DeepSeekProvider::try_new(config, api_key.clone())?;
                Some(Arc::new(provider) as Arc<dyn TextGenerator>)
            }
            None => {
                debug!(target: "app::ai", "no AI API key configured; AI path disabled");
                None
            }
        };

        Ok(Self { generator })
    }

    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    fn current_generator(&self) -> AppResult<&Arc<dyn TextGenerator>> {
        self.generator
            .as_ref()
            .ok_or_else(|| AppError::ai(AiErrorCode::MissingApiKey, MISSING_KEY_MESSAGE))
    }

    /// Asks the model for a schedule and parses its answer into raw items.
    ///
    /// Fails with an unavailable-style AI error when the call cannot be made
    /// and with `InvalidResponse` when the answer is not a schedule array.
    pub async fn interpret(
        &self,
        tasks: &[Task],
        start: DateTime<FixedOffset>,
    ) -> AppResult<Vec<RawScheduleItem>> {
        let generator = self.current_generator()?;
        let prompt = build_schedule_prompt(tasks, start);

        debug!(
            target: "app::ai",
            task_count = tasks.len(),
            prompt_len = prompt.len(),
            "requesting AI schedule"
        );

        let text = generator.generate(&prompt, GenerationOptions::SCHEDULE).await?;
        parse_schedule_items(&text)
    }

    /// Raw advice text from the model, trimmed. Callers own the fallback.
    pub async fn break_advice(&self, request: &BreakAdviceRequest) -> AppResult<String> {
        let generator = self.current_generator()?;
        let prompt = build_break_advice_prompt(request);
        let text = generator
            .generate(&prompt, GenerationOptions::BREAK_ADVICE)
            .await?;
        Ok(text.trim().to_string())
    }

    /// Configuration snapshot; makes no network call.
    pub fn status(&self) -> AiStatusDto {
        let last_checked_at = Utc::now().to_rfc3339();
        match &self.generator {
            Some(generator) => AiStatusDto {
                has_api_key: true,
                last_checked_at,
                provider: Some(generator.metadata()),
                message: None,
            },
            None => AiStatusDto {
                has_api_key: false,
                last_checked_at,
                provider: None,
                message: Some(format!(
                    "{MISSING_KEY_MESSAGE}; schedules use the built-in time-slot planner"
                )),
            },
        }
    }
}

pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl DeepSeekProvider {
    pub fn try_new(config: &AiConfig, api_key: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build AI HTTP client: {err}")))?;

        let base_url = config.base_url.trim_end_matches('/');
        let endpoint = format!("{base_url}/v1/chat/completions");

        Ok(Self {
            client,
            api_key,
            endpoint,
            model: config.model.clone(),
        })
    }

    fn build_request_body(&self, prompt: &str, options: GenerationOptions) -> JsonValue {
        let mut body = json!({
            "model": self.model,
            "temperature": options.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });
        if let (Some(max_tokens), Some(map)) = (options.max_tokens, body.as_object_mut()) {
            map.insert("max_tokens".to_string(), json!(max_tokens));
        }
        body
    }

    fn extract_tokens(body: &JsonValue) -> HashMap<String, u64> {
        let mut tokens = HashMap::new();

        if let Some(usage) = body.get("usage") {
            for (field, key) in [
                ("prompt_tokens", "prompt"),
                ("completion_tokens", "completion"),
                ("total_tokens", "total"),
            ] {
                if let Some(value) = usage.get(field).and_then(JsonValue::as_u64) {
                    tokens.insert(key.to_string(), value);
                }
            }
        }

        tokens
    }

    fn map_http_error(status: StatusCode, correlation_id: &str) -> AppError {
        let (code, message) = match status {
            StatusCode::UNAUTHORIZED => (
                AiErrorCode::MissingApiKey,
                "AI API key is invalid or unauthorized".to_string(),
            ),
            StatusCode::FORBIDDEN => (
                AiErrorCode::Forbidden,
                "AI API key lacks permission".to_string(),
            ),
            StatusCode::TOO_MANY_REQUESTS => (
                AiErrorCode::RateLimited,
                "AI provider rate limit reached".to_string(),
            ),
            status if status.is_server_error() => (
                AiErrorCode::ProviderUnavailable,
                format!("AI provider unavailable (status {})", status.as_u16()),
            ),
            StatusCode::BAD_REQUEST => (
                AiErrorCode::InvalidRequest,
                "AI provider rejected the request".to_string(),
            ),
            StatusCode::NOT_FOUND => (
                AiErrorCode::InvalidRequest,
                "AI endpoint not found".to_string(),
            ),
            status => (
                AiErrorCode::Unknown,
                format!("AI provider returned status {}", status.as_u16()),
            ),
        };

        AppError::ai_with_details(
            code,
            message,
            Some(correlation_id),
            Some(json!({ "status": status.as_u16() })),
        )
    }

    fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> AppError {
        if err.is_timeout() {
            AppError::ai_with_details(
                AiErrorCode::HttpTimeout,
                "AI request timed out",
                Some(correlation_id),
                None,
            )
        } else if err.is_connect() {
            AppError::ai_with_details(
                AiErrorCode::ProviderUnavailable,
                "could not connect to AI provider",
                Some(correlation_id),
                None,
            )
        } else if let Some(status) = err.status() {
            Self::map_http_error(status, correlation_id)
        } else {
            AppError::ai_with_details(
                AiErrorCode::Unknown,
                format!("AI request failed: {err}"),
                Some(correlation_id),
                None,
            )
        }
    }
}

#[async_trait]
impl TextGenerator for DeepSeekProvider {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> AppResult<String> {
        let correlation_id = Uuid::new_v4().to_string();
        let request_body = self.build_request_body(prompt, options);

        debug!(
            target: "app::ai::deepseek",
            correlation_id = %correlation_id,
            temperature = options.temperature,
            prompt_len = prompt.len(),
            "invoking DeepSeek"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    target: "app::ai::deepseek",
                    correlation_id = %correlation_id,
                    "DeepSeek request failed"
                );
                Self::error_from_reqwest(err, correlation_id.as_str())
            })?;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis();

        if !status.is_success() {
            warn!(
                target: "app::ai::deepseek",
                correlation_id = %correlation_id,
                status = status.as_u16(),
                latency_ms,
                "DeepSeek returned non-success status"
            );
            return Err(Self::map_http_error(status, correlation_id.as_str()));
        }

        let body: JsonValue = response.json().await.map_err(|err| {
            AppError::ai_with_details(
                AiErrorCode::InvalidResponse,
                "failed to decode DeepSeek response body",
                Some(correlation_id.as_str()),
                Some(json!({ "reason": err.to_string() })),
            )
        })?;

        let content = body
            .pointer("/choices/0/message/content")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                AppError::ai_with_details(
                    AiErrorCode::InvalidResponse,
                    "DeepSeek response is missing message content",
                    Some(correlation_id.as_str()),
                    Some(json!({ "reason": "missing_message_content" })),
                )
            })?;

        debug!(
            target: "app::ai::deepseek",
            correlation_id = %correlation_id,
            latency_ms,
            response_len = content.len(),
            tokens = ?Self::extract_tokens(&body),
            "DeepSeek responded"
        );

        Ok(content.to_string())
    }

    fn metadata(&self) -> AiProviderMetadata {
        AiProviderMetadata {
            provider_id: Some("deepseek".to_string()),
            model: Some(self.model.clone()),
            ..AiProviderMetadata::default()
        }
    }
}

pub mod testing {
    use super::*;

    /// Expose the status mapping for integration tests.
    pub fn map_http_error(status: StatusCode) -> AppError {
        DeepSeekProvider::map_http_error(status, "test-correlation-id")
    }

    /// An `AiService` talking to `base_url` with a throwaway key.
    pub fn service_for(base_url: &str, timeout: StdDuration) -> AppResult<AiService> {
        let config = AiConfig {
            api_key: Some("test-key".to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: "deepseek-chat".to_string(),
            http_timeout: timeout,
        };
        AiService::new(&config)
    }
}
