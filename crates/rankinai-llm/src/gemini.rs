//! Client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use rankinai_core::AppConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{
    check_status, http_client, parse_base_url, LlmProvider, LlmReply, RetryPolicy, TokenUsage,
};
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const VENDOR: &str = "gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl From<UsageMetadata> for TokenUsage {
    fn from(u: UsageMetadata) -> Self {
        Self {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
    retry: RetryPolicy,
}

impl GeminiClient {
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
            .join(&format!("models/{model}:generateContent"))
            .map_err(|e| LlmError::Config(format!("invalid endpoint for model '{model}': {e}")))?;
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
            retry: RetryPolicy::default(),
        })
    }

    /// Build from application config. Returns `Ok(None)` when no API key is
    /// configured.
    ///
    /// # Errors
    ///
    /// Propagates construction errors from [`GeminiClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, LlmError> {
        let Some(key) = config.gemini_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::with_base_url(
            key,
            &config.gemini_model,
            config.llm_timeout_secs,
            &config.gemini_base_url,
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
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: system_prompt,
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: user_prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.7 },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from_transport)?;
        let response = check_status(response).await?;
        let body = response.text().await.map_err(LlmError::from_transport)?;

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: format!("generateContent(model={})", self.model),
                source: e,
            })?;

        // Multi-part candidates are concatenated in order.
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse(VENDOR));
        }

        Ok(LlmReply {
            text: text.to_owned(),
            usage: parsed.usage_metadata.map(TokenUsage::from),
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
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
            "gemini generate content"
        );
        Ok(reply)
    }
}
