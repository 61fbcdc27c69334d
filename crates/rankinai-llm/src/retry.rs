//! Retry with exponential back-off and jitter for the assistant clients.
//!
//! [`retry_with_backoff`] wraps one vendor round trip and retries transient
//! failures: connection errors, timeouts, throttling and 5xx responses.
//! Everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;
use crate::provider::RetryPolicy;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        LlmError::Timeout | LlmError::RateLimited(_) => true,
        LlmError::Api { status, .. } => *status >= 500,
        LlmError::Deserialize { .. } | LlmError::EmptyResponse(_) | LlmError::Config(_) => false,
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// transient errors. Attempt `n` sleeps `backoff_base_ms × 2ⁿ⁻¹ ± 25 %`,
/// capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    vendor: &'static str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    vendor,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "assistant transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
