//! Client for the `OpenAI` chat-completions endpoint.

use async_trait::async_trait;
use rankinai_core::AppConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{
    check_status, http_client, parse_base_url, LlmProvider, LlmReply, RetryPolicy, TokenUsage,
};
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const VENDOR: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client. Use [`OpenAiClient::with_base_url`] to point at
/// a mock server or a compatible gateway.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if `base_url` is not a valid URL, or
    /// [`LlmError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, LlmError> {
        let endpoint = parse_base_url(base_url)?
            .join("chat/completions")
            .map_err(|e| LlmError::Config(format!("invalid endpoint: {e}")))?;
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
            retry: RetryPolicy::default(),
        })
    }

    /// Build from application config. Returns `Ok(None)` when no API key is
    /// configured, which leaves the platform unavailable.
    ///
    /// # Errors
    ///
    /// Propagates construction errors from [`OpenAiClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, LlmError> {
        let Some(key) = config.openai_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::with_base_url(
            key,
            &config.openai_model,
            config.llm_timeout_secs,
            &config.openai_base_url,
        )?
        .with_retry(RetryPolicy::from_app_config(config));
        Ok(Some(client))
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, system_prompt: &str, user_prompt: &str) -> Result<LlmReply, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from_transport)?;
        let response = check_status(response).await?;
        let body = response.text().await.map_err(LlmError::from_transport)?;

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: format!("chat/completions(model={})", self.model),
                source: e,
            })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(LlmError::EmptyResponse(VENDOR))?;

        Ok(LlmReply {
            text,
            usage: parsed.usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        VENDOR
    }

    async fn send(&self, system_prompt: &str, user_prompt: &str) -> Result<LlmReply, LlmError> {
        let started = std::time::Instant::now();
        let reply = retry_with_backoff(VENDOR, self.retry, || {
            self.send_once(system_prompt, user_prompt)
        })
        .await?;
        tracing::debug!(
            model = %self.model,
            duration_ms = started.elapsed().as_millis(),
            "openai chat completion"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_chat_completions() {
        let client = OpenAiClient::with_base_url("k", "gpt-4o-mini", 5, "http://localhost:9/v1/")
            .expect("client construction should not fail");
        assert_eq!(
            client.endpoint.as_str(),
            "http://localhost:9/v1/chat/completions"
        );
    }

    #[test]
    fn request_serializes_system_then_user() {
        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }
}
