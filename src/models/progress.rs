use serde::{Deserialize, Serialize};

/// Completion summary over the `task` items of a schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// 0-100.
    pub percentage: f64,
    pub total_minutes: u32,
    pub completed_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionToggleResponse {
    pub task_id: String,
    pub completed: bool,
}
