use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::llm::{LlmError, TextGenerator};
use crate::models::*;
use crate::workflows::templates::{self, IndexPicker, ThreadRngPicker};

pub const MESSAGES_PER_REQUEST: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("Could not parse model response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Remote,
    Fallback,
}

/// Generation result before it is collapsed to plain messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub source: GenerationSource,
    pub messages: Vec<GeneratedMessage>,
}

pub struct MessageGenerator {
    remote: Arc<dyn TextGenerator>,
    picker: Box<dyn IndexPicker>,
}

impl MessageGenerator {
    pub fn new(remote: Arc<dyn TextGenerator>) -> Self {
        Self::with_picker(remote, Box::new(ThreadRngPicker))
    }

    pub fn with_picker(remote: Arc<dyn TextGenerator>, picker: Box<dyn IndexPicker>) -> Self {
        Self { remote, picker }
    }

    /// Always yields three messages. Only invalid input is an error.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedMessage>, ValidationError> {
        request.validate()?;
        Ok(self.generate_tagged(request).await.messages)
    }

    pub async fn generate_tagged(&self, request: &GenerationRequest) -> Generation {
        match self.generate_remote(request).await {
            Ok(messages) => {
                info!(platform = %request.platform, "generated messages with remote model");
                Generation { source: GenerationSource::Remote, messages }
            }
            Err(e) => {
                warn!(platform = %request.platform, error = %e, "remote generation failed, using templates");
                Generation {
                    source: GenerationSource::Fallback,
                    messages: self.generate_fallback(request),
                }
            }
        }
    }

    pub async fn generate_remote(&self, request: &GenerationRequest) -> Result<Vec<GeneratedMessage>, GenerateError> {
        let prompt = build_prompt(request);
        let text = self.remote.complete(&prompt).await?;
        debug!(chars = text.len(), "received model text");
        parse_messages(&text)
    }

    pub fn generate_fallback(&self, request: &GenerationRequest) -> Vec<GeneratedMessage> {
        let greeting = templates::greeting(
            request.platform,
            request.client_name.as_deref(),
            self.picker.as_ref(),
        );
        let bodies = templates::render(request.platform, &request.niche, &request.offer, &greeting);

        bodies
            .into_iter()
            .zip(Strategy::ORDER)
            .map(|(content, strategy)| GeneratedMessage {
                content,
                tone: strategy.tone_for(request.platform),
            })
            .collect()
    }
}

pub fn build_prompt(request: &GenerationRequest) -> String {
    let tone = request.platform.tone_base();
    let platform = request.platform.as_str();
    let client_line = match &request.client_name {
        Some(name) => format!("The client's name is {}.", name),
        None => "Use a generic greeting.".to_string(),
    };
    let labels: Vec<String> = Strategy::ORDER.iter().map(|s| s.tone_for(request.platform)).collect();

    format!(
        r#"You are an expert copywriter specializing in cold outreach. Generate 3 different {tone_lower} outreach messages for {platform} targeting someone in the {niche} niche.

{client_line}

The offer is: {offer}

Requirements:
- Each message should have a different approach: Direct, Value-First, and Question-Based
- Keep messages concise and action-oriented (150-250 words max)
- Include appropriate {platform} etiquette and tone
- Make them feel personal, not templated
- Include a clear call-to-action
- Use emojis sparingly and appropriately for {platform}

Return ONLY a JSON array with this exact format:
[
  {{"content": "message 1 text", "tone": "{l0}"}},
  {{"content": "message 2 text", "tone": "{l1}"}},
  {{"content": "message 3 text", "tone": "{l2}"}}
]"#,
        tone_lower = tone.to_lowercase(),
        platform = platform,
        niche = request.niche,
        client_line = client_line,
        offer = request.offer,
        l0 = labels[0],
        l1 = labels[1],
        l2 = labels[2],
    )
}

/// Returns the first balanced `[...]` span, skipping brackets inside strings.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decodes model text into exactly three non-empty messages.
pub fn parse_messages(text: &str) -> Result<Vec<GeneratedMessage>, GenerateError> {
    let span = extract_json_array(text)
        .ok_or_else(|| GenerateError::Parse("no JSON array in response".to_string()))?;
    let messages: Vec<GeneratedMessage> =
        serde_json::from_str(span).map_err(|e| GenerateError::Parse(e.to_string()))?;

    if messages.len() != MESSAGES_PER_REQUEST {
        return Err(GenerateError::Parse(format!(
            "expected {} messages, got {}",
            MESSAGES_PER_REQUEST,
            messages.len()
        )));
    }
    if messages.iter().any(|m| m.content.trim().is_empty()) {
        return Err(GenerateError::Parse("empty message content".to_string()));
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockTextGenerator;
    use crate::workflows::templates::FixedPicker;

    fn request(platform: Platform, client_name: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            niche: "SEO & Digital Marketing".to_string(),
            platform,
            offer: "I double organic traffic in 90 days.".to_string(),
            client_name: client_name.map(str::to_string),
        }
    }

    const REMOTE_TEXT: &str = r#"Sure! Here you go:
```json
[
  {"content": "Hi Sam, [quick note] about SEO.", "tone": "Formal - Direct"},
  {"content": "Value first.", "tone": "Formal - Value-First"},
  {"content": "Question?", "tone": "Formal - Question-Based"}
]
```
Let me know if you want [more]."#;

    #[test]
    fn test_extract_json_array_balanced() {
        let span = extract_json_array(REMOTE_TEXT).unwrap();
        assert!(span.starts_with('['));
        assert!(span.ends_with(']'));
        assert!(!span.contains("[more]"));
        assert!(span.contains("[quick note]"));

        assert_eq!(extract_json_array("a [1, [2]] b [3]"), Some("[1, [2]]"));
        assert_eq!(extract_json_array(r#"["a\"]"]"#), Some(r#"["a\"]"]"#));
        assert_eq!(extract_json_array("no array"), None);
        assert_eq!(extract_json_array("[unterminated"), None);
    }

    #[test]
    fn test_parse_messages_requires_three() {
        let messages = parse_messages(REMOTE_TEXT).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].tone, "Formal - Value-First");

        let two = r#"[{"content":"a","tone":"x"},{"content":"b","tone":"y"}]"#;
        assert!(matches!(parse_messages(two), Err(GenerateError::Parse(_))));

        let wrong_shape = r#"[{"text":"a"},{"text":"b"},{"text":"c"}]"#;
        assert!(matches!(parse_messages(wrong_shape), Err(GenerateError::Parse(_))));

        let blank = r#"[{"content":" ","tone":"x"},{"content":"b","tone":"y"},{"content":"c","tone":"z"}]"#;
        assert!(matches!(parse_messages(blank), Err(GenerateError::Parse(_))));
    }

    #[test]
    fn test_build_prompt_contents() {
        let prompt = build_prompt(&request(Platform::Email, Some("Sam")));
        assert!(prompt.contains("3 different formal outreach messages for email"));
        assert!(prompt.contains("The client's name is Sam."));
        assert!(prompt.contains("The offer is: I double organic traffic in 90 days."));
        assert!(prompt.contains(r#""tone": "Formal - Question-Based""#));

        let generic = build_prompt(&request(Platform::Instagram, None));
        assert!(generic.contains("Use a generic greeting."));
        assert!(generic.contains("casual outreach messages"));
    }

    #[tokio::test]
    async fn test_remote_success_is_trusted_verbatim() {
        let mock = Arc::new(MockTextGenerator::new());
        mock.enqueue_text(REMOTE_TEXT);
        let generator = MessageGenerator::new(mock.clone());

        let result = generator.generate_tagged(&request(Platform::Email, Some("Sam"))).await;
        assert_eq!(result.source, GenerationSource::Remote);
        assert_eq!(result.messages[0].content, "Hi Sam, [quick note] about SEO.");
        assert_eq!(mock.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_error_falls_back() {
        let mock = Arc::new(MockTextGenerator::new());
        mock.enqueue_error(LlmError::Api { status: 503, message: "overloaded".into() });
        let generator = MessageGenerator::with_picker(mock, Box::new(FixedPicker(1)));

        let req = request(Platform::Linkedin, None);
        let result = generator.generate_tagged(&req).await;
        assert_eq!(result.source, GenerationSource::Fallback);
        let tones: Vec<&str> = result.messages.iter().map(|m| m.tone.as_str()).collect();
        assert_eq!(
            tones,
            ["Professional - Direct", "Professional - Value-First", "Professional - Question-Based"]
        );
        for m in &result.messages {
            assert!(m.content.starts_with("Hello!"));
            assert!(m.content.contains(&req.offer));
        }
    }

    #[tokio::test]
    async fn test_garbled_remote_output_falls_back() {
        let mock = Arc::new(MockTextGenerator::new());
        mock.enqueue_text(r#"[{"content":"only one","tone":"Casual - Direct"}]"#);
        let generator = MessageGenerator::new(mock);

        let result = generator.generate_tagged(&request(Platform::Instagram, Some("Kai"))).await;
        assert_eq!(result.source, GenerationSource::Fallback);
        assert_eq!(result.messages.len(), 3);
        assert!(result.messages[0].content.starts_with("Hi Kai! 🌟"));
        assert_eq!(result.messages[2].tone, "Casual - Question-Based");
    }

    #[tokio::test]
    async fn test_missing_key_falls_back() {
        let mock = Arc::new(MockTextGenerator::new());
        mock.enqueue_error(LlmError::MissingApiKey);
        let generator = MessageGenerator::new(mock);

        let messages = generator.generate(&request(Platform::Upwork, None)).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].tone, "Professional - Direct");
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_fields() {
        let generator = MessageGenerator::new(Arc::new(MockTextGenerator::new()));
        let mut req = request(Platform::Email, None);
        req.offer = "   ".to_string();
        assert_eq!(
            generator.generate(&req).await,
            Err(ValidationError::EmptyField("offer"))
        );
    }
}
