use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notification raised for a merchant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    LowCredits,
    CitationDrop,
}

impl AlertKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::LowCredits => "LOW_CREDITS",
            AlertKind::CitationDrop => "CITATION_DROP",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    pub shop_id: i64,
    pub product_id: Option<i64>,
    pub kind: AlertKind,
    pub message: String,
    pub metadata: Value,
}

/// Audit-log entry kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ScanCompleted,
    ScanFailed,
    RecommendationsGenerated,
    OptimizationApplied,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ScanCompleted => "scan_completed",
            EventKind::ScanFailed => "scan_failed",
            EventKind::RecommendationsGenerated => "recommendations_generated",
            EventKind::OptimizationApplied => "optimization_applied",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub shop_id: i64,
    pub product_id: Option<i64>,
    pub kind: EventKind,
    pub payload: Value,
}
