pub mod commands;
pub mod config;
pub mod db;
pub mod history;
pub mod llm;
pub mod logging;
pub mod models;
pub mod workflows;

pub use commands::Commands;
pub use history::{HistoryStore, MAX_MESSAGES};
pub use models::{GeneratedMessage, GenerationRequest, HistoryRecord, HistoryStats, Platform};
pub use workflows::MessageGenerator;
