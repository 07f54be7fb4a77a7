pub mod ai_response_parser;
pub mod ai_service;
pub mod break_advice;
pub mod progress;
pub mod prompt_templates;
pub mod request_builder;
pub mod schedule_assembler;
pub mod schedule_service;
pub mod schedule_utils;
pub mod session_service;
pub mod time_slot_scheduler;
