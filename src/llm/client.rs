use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::llm::types::*;

/// Anything that turns a prompt into raw model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

pub const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    http: Client,
    config: LlmConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;

        Ok(Self { http, config, api_key })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// The key travels in a header so it never shows up in URLs or error text.
    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(self.api_key.trim())
            .map_err(|_| LlmError::Http("API key is not a valid header value".to_string()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let request = GenerateContentRequest::from_prompt(prompt);
        debug!(model = %self.config.model, "sending generateContent request");

        let response = self.http
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Http(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.without_url().to_string()))?;

        body.first_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn config_for(base_url: String) -> LlmConfig {
        LlmConfig {
            base_url,
            model: "gemini-pro".to_string(),
            timeout_secs: 5,
        }
    }

    /// Serves one canned HTTP response and returns the raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .filter_map(|l| l.split_once(':'))
                        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (base_url, handle)
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let client = GeminiClient::new(config_for("http://127.0.0.1:9".to_string()), "   ".to_string()).unwrap();
        let result = client.complete("prompt").await;
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_has_no_key() {
        let client = GeminiClient::new(
            config_for("https://example.test/v1beta/".to_string()),
            "k123".to_string(),
        ).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn test_connection_error_does_not_expose_key() {
        let client = GeminiClient::new(
            config_for("http://127.0.0.1:9".to_string()),
            "SECRET_KEY_123".to_string(),
        ).unwrap();
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_) | LlmError::Timeout));
        assert!(!err.to_string().contains("SECRET_KEY_123"));
    }

    #[tokio::test]
    async fn test_success_sends_key_header_and_returns_text() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"[1,2,3]"}],"role":"model"},"finishReason":"STOP"}]}"#,
        ).await;
        let client = GeminiClient::new(config_for(base_url), "SECRET_KEY_123".to_string()).unwrap();

        assert_eq!(client.complete("hello").await.unwrap(), "[1,2,3]");

        let request = server.await.unwrap();
        let head = request.split("\r\n\r\n").next().unwrap_or_default();
        assert!(head.starts_with("POST /models/gemini-pro:generateContent HTTP/1.1"));
        assert!(head.to_lowercase().contains("x-goog-api-key: secret_key_123"));
        assert!(request.contains(r#""maxOutputTokens":2048"#));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let (base_url, server) = serve_once("503 Service Unavailable", r#"{"error":"overloaded"}"#).await;
        let client = GeminiClient::new(config_for(base_url), "key".to_string()).unwrap();

        let err = client.complete("hello").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("overloaded"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_invalid_response() {
        let (base_url, server) = serve_once("200 OK", "not json at all").await;
        let client = GeminiClient::new(config_for(base_url), "key".to_string()).unwrap();
        assert!(matches!(client.complete("hello").await, Err(LlmError::InvalidResponse(_))));
        server.await.unwrap();

        let (base_url, server) = serve_once("200 OK", r#"{"candidates":[]}"#).await;
        let client = GeminiClient::new(config_for(base_url), "key".to_string()).unwrap();
        assert!(matches!(client.complete("hello").await, Err(LlmError::InvalidResponse(_))));
        server.await.unwrap();
    }
}
