use async_trait::async_trait;
use rankinai_core::AppConfig;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Token accounting reported by the vendor, when it reports any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reply text plus whatever usage metadata came with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// A chat assistant that answers one prompt at a time.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Vendor label used in logs.
    fn name(&self) -> &'static str;

    /// Send `user_prompt` under `system_prompt` and return the reply.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] once retries are exhausted or on the first
    /// non-retriable failure.
    async fn send(&self, system_prompt: &str, user_prompt: &str) -> Result<LlmReply, LlmError>;
}

/// Retry budget applied inside each client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.llm_max_retries,
            backoff_base_ms: config.llm_retry_backoff_base_ms,
        }
    }

    /// Single attempt, no back-off. Useful in tests.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }
}

/// Turn a non-2xx response into the matching [`LlmError`], pulling the
/// vendor's `error.message` out of the body when present.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or(body);

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited(message));
    }
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Normalise a base URL to end in exactly one slash so relative joins append
/// rather than replace the last path segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<reqwest::Url, LlmError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    reqwest::Url::parse(&normalised)
        .map_err(|e| LlmError::Config(format!("invalid base URL '{base_url}': {e}")))
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .connect_timeout(std::time::Duration::from_secs(10))
        .user_agent("rankinai/0.1 (citation-scan)")
        .build()
        .map_err(LlmError::Http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_single_trailing_slash() {
        let url = parse_base_url("https://api.openai.com/v1//").unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/");
        assert_eq!(
            url.join("chat/completions").unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn default_retry_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 2);
        assert_eq!(p.backoff_base_ms, 500);
    }
}
