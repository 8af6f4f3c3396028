//! Chat-completion client for an OpenAI-compatible endpoint (DeepSeek by default).
//!
//! # Architecture
//!
//! - [`ChatCompletion`]: the seam the summarizer talks to
//! - [`ChatClient`]: the HTTP implementation, going through the shared
//!   [`Transport`] so transient failures are retried with backoff

use crate::config::{ChatSettings, Secret};
use crate::error::ApiError;
use crate::transport::{Transport, ensure_success};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Something that can answer a chat request with the assistant's text.
pub trait ChatCompletion {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ApiError>;
}

/// HTTP [`ChatCompletion`] implementation.
#[derive(Debug)]
pub struct ChatClient {
    transport: Transport,
    endpoint: String,
    api_key: Secret,
}

impl ChatClient {
    pub fn new(transport: Transport, settings: &ChatSettings, api_key: Secret) -> Self {
        Self {
            transport,
            endpoint: settings.endpoint.clone(),
            api_key,
        }
    }
}

impl ChatCompletion for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let t0 = Instant::now();
        let bearer = format!("Bearer {}", self.api_key.expose());

        let response = self
            .transport
            .send_with_retry(|http| {
                http.post(&self.endpoint)
                    .header(AUTHORIZATION, &bearer)
                    .header(CONTENT_TYPE, "application/json")
                    .json(request)
            })
            .await?;

        let body = ensure_success(response).await?.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ApiError::Malformed("response has no choices".to_string()))?;

        info!(elapsed_ms = t0.elapsed().as_millis(), "Chat completion succeeded");
        debug!(chars = content.chars().count(), "Chat completion content");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::require;
    use crate::test_support::{fast_transport, serve};

    fn client(base: &str, max_retries: usize) -> ChatClient {
        let settings = ChatSettings {
            endpoint: format!("{}/v1/chat/completions", base),
            ..ChatSettings::default()
        };
        ChatClient::new(
            fast_transport(max_retries),
            &settings,
            require("DEEPSEEK_API_KEY", Some("chat-key")).unwrap(),
        )
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "deepseek-chat".to_string(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
            temperature: 0.5,
            max_tokens: 200,
        }
    }

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 200);
        assert_eq!(json["temperature"], 0.5);
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"A | B | C"}}]}"#;
        let (base, captured) = serve(vec![(200, body.to_string())]).await;

        let content = client(&base, 0).complete(&request()).await.unwrap();
        assert_eq!(content, "A | B | C");

        let requests = captured.lock().unwrap();
        let head = requests[0].head.to_lowercase();
        assert!(head.starts_with("post /v1/chat/completions"));
        assert!(head.contains("authorization: bearer chat-key"));
        let sent: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn test_complete_surfaces_server_error() {
        let (base, captured) = serve(vec![
            (500, "oops".to_string()),
            (500, "oops again".to_string()),
        ])
        .await;
        let err = client(&base, 1).complete(&request()).await.unwrap_err();
        assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
        assert_eq!(captured.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_malformed() {
        let (base, _) = serve(vec![(200, r#"{"choices":[]}"#.to_string())]).await;
        let err = client(&base, 0).complete(&request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }
}
