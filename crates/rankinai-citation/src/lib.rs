//! Citation analysis for `RankInAI` scans.
//!
//! Builds the shopping question sent to an assistant and turns the assistant's
//! free-text reply into a structured verdict: whether the product was cited,
//! where, in what tone, and which competitors were named instead. Everything
//! here is a pure function over strings; lexicons are passed in as
//! configuration so tests can substitute fixtures.

pub mod analyzer;
pub mod competitors;
pub mod lexicon;
pub mod mention;
pub mod question;
pub mod sentiment;
pub mod topics;

pub use analyzer::{AnalyzerConfig, CitationAnalyzer, CitationVerdict, ConfidenceTable, Listing};
pub use competitors::extract_competitors;
pub use lexicon::{Lexicons, Topic};
pub use mention::{detect_mention, extract_excerpt, extract_position, MentionKind};
pub use question::{generate_question, SYSTEM_PROMPT};
pub use sentiment::classify_sentiment;
pub use topics::{ignored_features, missing_topics};
