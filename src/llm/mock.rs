use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::client::TextGenerator;
use crate::llm::types::LlmError;

/// Scripted `TextGenerator`. Each call pops the next queued result and
/// records the prompt it was given. An empty queue yields an HTTP error.
#[derive(Default)]
pub struct MockTextGenerator {
    results: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_text(&self, text: impl Into<String>) -> &Self {
        self.push(Ok(text.into()))
    }

    pub fn enqueue_error(&self, error: LlmError) -> &Self {
        self.push(Err(error))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn push(&self, result: Result<String, LlmError>) -> &Self {
        if let Ok(mut queue) = self.results.lock() {
            queue.push_back(result);
        }
        self
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.results
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| Err(LlmError::Http("no mocked result queued".to_string())))
    }
}
