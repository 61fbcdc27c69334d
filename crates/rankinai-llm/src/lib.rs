//! Chat clients for the assistants `RankInAI` scans against.
//!
//! Each vendor client implements [`LlmProvider`], a single
//! system-prompt/user-prompt exchange that returns the reply text and token
//! usage. Transient failures are retried with jittered exponential back-off
//! before surfacing to the caller.

pub mod error;
pub mod gemini;
pub mod openai;
pub mod provider;
pub(crate) mod retry;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use provider::{LlmProvider, LlmReply, RetryPolicy, TokenUsage};
