//! Chat-completions client for Mistral and other OpenAI-compatible endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use lorekeep_core::error::{Error, Result};
use lorekeep_core::settings::GenerationSettings;
use lorekeep_core::traits::TextGenerator;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

enum Failure {
    Retryable(String),
    Fatal(String),
}

pub struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl ChatClient {
    /// Reads the bearer key from the env var named by `api_key_env`.
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| Error::InvalidConfig(format!("environment variable {} is not set", settings.api_key_env)))?;
        Self::with_api_key(settings, &api_key)
    }

    pub fn with_api_key(settings: &GenerationSettings, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| Error::InvalidConfig(format!("Invalid API key format: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;
        info!("Chat client: endpoint={}, model={}", settings.endpoint, settings.model);
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_retries: settings.max_retries,
        })
    }

    async fn send_once(&self, prompt: &str) -> std::result::Result<String, Failure> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Failure::Retryable(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Failure::Retryable(format!("Failed to read response: {}", e)))?;
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(Failure::Retryable(format!("{} from {}: {}", status, self.endpoint, truncate(&body))));
        }
        if !status.is_success() {
            return Err(Failure::Fatal(format!("{} from {}: {}", status, self.endpoint, truncate(&body))));
        }
        extract_content(&body).map_err(Failure::Fatal)
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(prompt).await {
                Ok(content) => {
                    debug!("Chat reply: {} chars", content.chars().count());
                    return Ok(content);
                }
                Err(Failure::Retryable(msg)) if attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = retry_backoff(attempt);
                    warn!("Chat request failed ({}), retry {}/{} in {:?}", msg, attempt, self.max_retries, backoff);
                    tokio::time::sleep(backoff).await;
                }
                Err(Failure::Retryable(msg)) | Err(Failure::Fatal(msg)) => return Err(Error::Provider(msg)),
            }
        }
    }
}

/// Content of the first choice in a chat-completions response body.
pub fn extract_content(body: &str) -> std::result::Result<String, String> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| format!("Malformed chat response: {}", e))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| "Chat response has no content".to_string())
}

const BASE_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (1-based): 500ms doubling, capped at 30s.
fn retry_backoff(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    BASE_BACKOFF.saturating_mul(factor).min(MAX_BACKOFF)
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hogwarts\nCastle"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Hogwarts\nCastle");
    }

    #[test]
    fn rejects_empty_or_malformed_bodies() {
        assert!(extract_content(r#"{"choices":[]}"#).is_err());
        assert!(extract_content(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).is_err());
        assert!(extract_content("<html>").is_err());
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(retry_backoff(1), Duration::from_millis(500));
        assert_eq!(retry_backoff(2), Duration::from_secs(1));
        assert_eq!(retry_backoff(3), Duration::from_secs(2));
        assert_eq!(retry_backoff(7), MAX_BACKOFF);
        assert_eq!(retry_backoff(100), MAX_BACKOFF);
        assert_eq!(retry_backoff(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn missing_key_is_config_error() {
        let settings = GenerationSettings { api_key_env: "LOREKEEP_TEST_KEY_THAT_IS_NOT_SET".into(), ..GenerationSettings::default() };
        assert!(matches!(ChatClient::new(&settings), Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_provider_error() {
        let settings = GenerationSettings {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
            timeout_secs: 2,
            max_retries: 0,
            ..GenerationSettings::default()
        };
        let client = ChatClient::with_api_key(&settings, "test").unwrap();
        assert!(matches!(client.generate("hi").await, Err(Error::Provider(_))));
    }
}
