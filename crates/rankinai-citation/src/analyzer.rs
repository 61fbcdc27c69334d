//! Combines the individual heuristics into one verdict per reply.

use rankinai_core::{CompetitorMode, Platform, Product, Sentiment};
use serde::{Deserialize, Serialize};

use crate::competitors::extract_competitors;
use crate::lexicon::Lexicons;
use crate::mention::{detect_mention, extract_excerpt, extract_position, MentionKind};
use crate::sentiment::classify_sentiment;
use crate::topics::{ignored_features, missing_topics};

/// The product fields the analyzer reads, borrowed from wherever the
/// caller keeps them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Listing<'a> {
    pub title: &'a str,
    pub vendor: Option<&'a str>,
    pub product_type: Option<&'a str>,
    pub category: Option<&'a str>,
    pub description: Option<&'a str>,
    pub tags: &'a [String],
}

impl<'a> From<&'a Product> for Listing<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            title: &product.title,
            vendor: product.vendor.as_deref(),
            product_type: product.product_type.as_deref(),
            category: product.category.as_deref(),
            description: product.description.as_deref(),
            tags: &product.tags,
        }
    }
}

/// Fixed confidence scalars per platform and outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceTable {
    pub chatgpt_cited: f64,
    pub chatgpt_not_cited: f64,
    pub gemini_cited: f64,
    pub gemini_not_cited: f64,
}

impl Default for ConfidenceTable {
    fn default() -> Self {
        Self {
            chatgpt_cited: 0.85,
            chatgpt_not_cited: 0.15,
            gemini_cited: 0.80,
            gemini_not_cited: 0.20,
        }
    }
}

impl ConfidenceTable {
    #[must_use]
    pub fn for_outcome(&self, platform: Platform, cited: bool) -> f64 {
        match (platform, cited) {
            (Platform::ChatGpt, true) => self.chatgpt_cited,
            (Platform::ChatGpt, false) => self.chatgpt_not_cited,
            (Platform::Gemini, true) => self.gemini_cited,
            (Platform::Gemini, false) => self.gemini_not_cited,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub lexicons: Lexicons,
    pub competitor_mode: CompetitorMode,
    pub confidence: ConfidenceTable,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lexicons: Lexicons::default(),
            competitor_mode: CompetitorMode::Enriched,
            confidence: ConfidenceTable::default(),
        }
    }
}

/// Structured reading of one assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitationVerdict {
    pub is_cited: bool,
    pub mention: Option<MentionKind>,
    /// Present only when cited and a sentence names the product.
    pub excerpt: Option<String>,
    /// 1-based list rank, present only when cited.
    pub position: Option<u32>,
    /// Present only when cited.
    pub sentiment: Option<Sentiment>,
    pub competitors: Vec<String>,
    pub missing_topics: Vec<String>,
    pub ignored_features: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CitationAnalyzer {
    config: AnalyzerConfig,
}

impl CitationAnalyzer {
    #[must_use]
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run every heuristic over `reply`. Excerpt, position and sentiment are
    /// only computed for cited replies; competitor and gap lists always are.
    #[must_use]
    pub fn analyze(&self, reply: &str, listing: &Listing<'_>, platform: Platform) -> CitationVerdict {
        let lex = &self.config.lexicons;
        let mention = detect_mention(reply, listing);
        let is_cited = mention.is_some();

        let (excerpt, position, sentiment) = if is_cited {
            let excerpt = extract_excerpt(reply, listing);
            (
                (!excerpt.is_empty()).then_some(excerpt),
                extract_position(reply, listing),
                Some(classify_sentiment(reply, &lex.positive, &lex.negative)),
            )
        } else {
            (None, None, None)
        };

        CitationVerdict {
            is_cited,
            mention,
            excerpt,
            position,
            sentiment,
            competitors: extract_competitors(
                reply,
                listing,
                &lex.reference_brands,
                self.config.competitor_mode,
            ),
            missing_topics: missing_topics(reply, listing, &lex.topics),
            ignored_features: ignored_features(reply, listing),
            confidence: self.config.confidence.for_outcome(platform, is_cited),
        }
    }
}
