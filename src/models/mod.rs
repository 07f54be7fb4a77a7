pub mod ai_types;
pub mod progress;
pub mod schedule;
pub mod task;
