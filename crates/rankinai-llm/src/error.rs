use thiserror::Error;

/// Errors returned by the assistant clients.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The vendor throttled the request (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The response body did not match the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The vendor answered successfully but with no text.
    #[error("empty response from {0}")]
    EmptyResponse(&'static str),

    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The client could not be built from the supplied settings.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Maps a transport error, separating timeouts so callers can tell a slow
    /// vendor from an unreachable one.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}
