use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TitleSuggestion {
    pub suggested: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptionSuggestion {
    pub key_points: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagSuggestion {
    pub add: Vec<String>,
    pub remove: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoSuggestion {
    pub meta_title: String,
    pub meta_description: String,
    pub reason: String,
}

/// Structured listing changes proposed for one product.
///
/// Every field defaults so that partially-filled model output still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Suggestions {
    pub title: TitleSuggestion,
    pub description: DescriptionSuggestion,
    pub tags: TagSuggestion,
    pub seo: SeoSuggestion,
}

/// Where a recommendation bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Llm,
    Fallback,
}

impl RecommendationSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationSource::Llm => "llm",
            RecommendationSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "llm" => Ok(RecommendationSource::Llm),
            "fallback" => Ok(RecommendationSource::Fallback),
            other => Err(CoreError::InvalidKind {
                kind: "recommendation source",
                value: other.to_string(),
            }),
        }
    }
}

/// A recommendation bundle for a product.
///
/// Immutable apart from the single transition to `applied = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Optimization {
    pub id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub suggestions: Suggestions,
    pub quick_wins: Vec<String>,
    pub current_score: f64,
    pub potential_score: f64,
    pub source: RecommendationSource,
    pub applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOptimization {
    pub product_id: i64,
    pub shop_id: i64,
    pub suggestions: Suggestions,
    pub quick_wins: Vec<String>,
    pub current_score: f64,
    pub potential_score: f64,
    pub source: RecommendationSource,
}
