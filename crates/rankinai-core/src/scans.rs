use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// LLM assistant a scan was run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "CHATGPT")]
    ChatGpt,
    #[serde(rename = "GEMINI")]
    Gemini,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::ChatGpt, Platform::Gemini];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::ChatGpt => "CHATGPT",
            Platform::Gemini => "GEMINI",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHATGPT" | "OPENAI" => Ok(Platform::ChatGpt),
            "GEMINI" => Ok(Platform::Gemini),
            _ => Err(CoreError::InvalidPlatform(s.to_string())),
        }
    }
}

/// Tone of a reply that cited the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Neutral => "NEUTRAL",
            Sentiment::Negative => "NEGATIVE",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Ok(Sentiment::Positive),
            "NEUTRAL" => Ok(Sentiment::Neutral),
            "NEGATIVE" => Ok(Sentiment::Negative),
            _ => Err(CoreError::InvalidSentiment(s.to_string())),
        }
    }
}

/// One immutable question/answer round trip against one platform.
///
/// Scans are append-only: nothing in the workspace updates or deletes them,
/// and every product statistic is recomputed from the full scan history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub platform: Platform,
    pub question: String,
    pub response: String,
    pub is_cited: bool,
    pub citation_excerpt: Option<String>,
    /// 1-based rank when the reply was an enumerated list.
    pub citation_position: Option<i32>,
    /// `None` whenever `is_cited` is false.
    pub sentiment: Option<Sentiment>,
    pub competitors: Vec<String>,
    pub missing_topics: Vec<String>,
    pub ignored_features: Vec<String>,
    /// Fixed per-platform constant in `[0.0, 1.0]`.
    pub confidence: f64,
    pub credits_used: i32,
    pub duration_ms: i64,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    /// Client-generated key; unique per scan attempt.
    pub request_key: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a [`Scan`]; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScan {
    pub product_id: i64,
    pub shop_id: i64,
    pub platform: Platform,
    pub question: String,
    pub response: String,
    pub is_cited: bool,
    pub citation_excerpt: Option<String>,
    pub citation_position: Option<i32>,
    pub sentiment: Option<Sentiment>,
    pub competitors: Vec<String>,
    pub missing_topics: Vec<String>,
    pub ignored_features: Vec<String>,
    pub confidence: f64,
    pub credits_used: i32,
    pub duration_ms: i64,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    /// Lets the writer find out whether an insert that reported an error
    /// was committed anyway.
    pub request_key: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("chatgpt".parse::<Platform>().unwrap(), Platform::ChatGpt);
        assert_eq!("GEMINI".parse::<Platform>().unwrap(), Platform::Gemini);
        assert_eq!("openai".parse::<Platform>().unwrap(), Platform::ChatGpt);
        assert!("claude".parse::<Platform>().is_err());
    }

    #[test]
    fn platform_serializes_as_uppercase_tag() {
        let json = serde_json::to_string(&Platform::ChatGpt).expect("serialize");
        assert_eq!(json, "\"CHATGPT\"");
        let back: Platform = serde_json::from_str("\"GEMINI\"").expect("deserialize");
        assert_eq!(back, Platform::Gemini);
    }

    #[test]
    fn sentiment_display_matches_storage_form() {
        for s in [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative] {
            assert_eq!(s.to_string().parse::<Sentiment>().unwrap(), s);
        }
    }
}
