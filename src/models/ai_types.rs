use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::models::schedule::ScheduledTask;

/// Sampling parameters for one text-generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Low temperature so schedule JSON stays close to deterministic.
    pub const SCHEDULE: GenerationOptions = GenerationOptions {
        temperature: 0.2,
        max_tokens: Some(2000),
    };

    pub const BREAK_ADVICE: GenerationOptions = GenerationOptions {
        temperature: 0.7,
        max_tokens: Some(300),
    };
}

/// Metadata describing the provider that produced a response.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiProviderMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<HashMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonValue>,
}

/// Configuration status of the text-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AiStatusDto {
    pub has_api_key: bool,
    pub last_checked_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<AiProviderMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakAdviceRequest {
    #[serde(default)]
    pub task_name: String,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub task_duration: Option<u32>,
    #[serde(default)]
    pub time_of_day: Option<String>,
}

/// Whole minutes from any JSON number or numeric string; anything else is
/// treated as absent so break advice never fails on the duration alone.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = JsonValue::deserialize(deserializer)?;
    let minutes = match &raw {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(minutes
        .filter(|value| value.is_finite() && *value >= 0.0 && *value <= f64::from(u32::MAX))
        .map(|value| value.round() as u32))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakAdviceResponse {
    pub advice: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBreakAdviceRequest {
    #[serde(default)]
    pub schedule: Vec<ScheduledTask>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBreakAdviceResponse {
    /// Break item id to advice text.
    pub advice: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn duration_of(body: JsonValue) -> Option<u32> {
        serde_json::from_value::<BreakAdviceRequest>(body)
            .expect("break advice body")
            .task_duration
    }

    #[test]
    fn task_duration_accepts_any_number_shape() {
        assert_eq!(duration_of(json!({ "taskName": "A", "taskDuration": 45 })), Some(45));
        assert_eq!(duration_of(json!({ "taskName": "A", "taskDuration": 22.5 })), Some(23));
        assert_eq!(duration_of(json!({ "taskName": "A", "taskDuration": " 45 " })), Some(45));
        assert_eq!(duration_of(json!({ "taskName": "A", "taskDuration": "soon" })), None);
        assert_eq!(duration_of(json!({ "taskName": "A", "taskDuration": -5 })), None);
        assert_eq!(duration_of(json!({ "taskName": "A", "taskDuration": null })), None);
        assert_eq!(duration_of(json!({ "taskName": "A" })), None);
    }
}
