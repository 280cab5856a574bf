pub mod client;
pub mod mock;
pub mod types;

pub use client::{GeminiClient, TextGenerator};
pub use mock::MockTextGenerator;
pub use types::{GenerationConfig, LlmConfig, LlmError};
