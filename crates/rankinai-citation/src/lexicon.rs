//! Default word lists used by the citation heuristics.
//!
//! Keys are lowercase single words except brand names, which keep their
//! display casing and are matched case-insensitively.

use serde::{Deserialize, Serialize};

pub(crate) const POSITIVE_WORDS: &[&str] = &[
    "recommend",
    "recommended",
    "best",
    "excellent",
    "great",
    "top",
    "quality",
    "popular",
    "reliable",
    "love",
    "loved",
    "favorite",
    "favourite",
    "outstanding",
    "durable",
    "comfortable",
    "premium",
    "trusted",
    "standout",
    "impressive",
];

pub(crate) const NEGATIVE_WORDS: &[&str] = &[
    "avoid",
    "poor",
    "bad",
    "worst",
    "cheap",
    "flimsy",
    "issues",
    "problems",
    "complaints",
    "disappointing",
    "overpriced",
    "lacks",
    "unreliable",
    "defective",
    "drawback",
    "drawbacks",
    "downside",
];

pub(crate) const REFERENCE_BRANDS: &[&str] = &[
    "Nike",
    "Adidas",
    "Puma",
    "Reebok",
    "Under Armour",
    "New Balance",
    "Lululemon",
    "Gymshark",
    "Manduka",
    "Gaiam",
    "Liforme",
    "Patagonia",
    "The North Face",
    "Columbia",
    "Apple",
    "Samsung",
    "Sony",
    "Bose",
    "Anker",
    "Logitech",
    "Dyson",
    "KitchenAid",
    "Cuisinart",
    "Ninja",
    "Le Creuset",
    "Lodge",
    "Yeti",
    "Hydro Flask",
    "Stanley",
    "Allbirds",
    "Everlane",
    "Uniqlo",
    "Zara",
    "H&M",
    "Glossier",
    "CeraVe",
    "The Ordinary",
    "Olaplex",
    "Casper",
    "Purple",
    "Amazon Basics",
    "IKEA",
];

/// A shopper-facing theme and the words that signal it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub keywords: Vec<String>,
}

const TOPICS: &[(&str, &[&str])] = &[
    ("price", &["price", "priced", "affordable", "budget", "value", "expensive", "cost"]),
    ("quality", &["quality", "craftsmanship", "well-made", "premium"]),
    ("durability", &["durable", "durability", "lasting", "long-lasting", "sturdy"]),
    ("materials", &["material", "materials", "fabric", "cotton", "leather", "rubber", "eco-friendly"]),
    ("sizing", &["size", "sizes", "sizing", "fit", "dimensions", "thickness"]),
    ("shipping", &["shipping", "delivery", "ships"]),
    ("warranty", &["warranty", "guarantee", "returns"]),
    ("reviews", &["reviews", "rated", "ratings", "testimonials"]),
    ("sustainability", &["sustainable", "sustainability", "recycled", "organic", "biodegradable"]),
    ("comfort", &["comfort", "comfortable", "cushioning", "soft"]),
    ("grip", &["grip", "non-slip", "traction"]),
    ("design", &["design", "style", "color", "colors", "colour"]),
];

/// Word lists consumed by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicons {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub reference_brands: Vec<String>,
    pub topics: Vec<Topic>,
}

impl Default for Lexicons {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| (*w).to_string()).collect();
        Self {
            positive: owned(POSITIVE_WORDS),
            negative: owned(NEGATIVE_WORDS),
            reference_brands: owned(REFERENCE_BRANDS),
            topics: TOPICS
                .iter()
                .map(|(name, keywords)| Topic {
                    name: (*name).to_string(),
                    keywords: owned(keywords),
                })
                .collect(),
        }
    }
}

/// Lowercase a word and strip surrounding punctuation, keeping inner
/// hyphens and apostrophes (`"non-slip,"` → `"non-slip"`).
pub(crate) fn normalize_token(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Lowercased, punctuation-trimmed tokens of `text`, empties removed.
pub(crate) fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect()
}
