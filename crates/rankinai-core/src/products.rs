use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog item belonging to a shop, synced from the storefront.
///
/// The rate fields are a cache over the product's scan history and can be
/// rebuilt at any time by recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub shop_id: i64,
    /// Storefront product id, stored as a string to avoid precision loss.
    pub external_id: String,
    pub title: String,
    pub handle: Option<String>,
    /// Plain-text description (HTML already stripped by the catalog sync).
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub tags: Vec<String>,
    /// Overall citation rate, `0.0..=100.0`.
    pub citation_rate: f64,
    pub chatgpt_rate: f64,
    pub gemini_rate: f64,
    pub total_scans: i32,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub last_optimized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog fields written by the product sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub external_id: String,
    pub title: String,
    pub handle: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub tags: Vec<String>,
}

/// Cached statistics written after every recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductStatsUpdate {
    pub citation_rate: f64,
    pub chatgpt_rate: f64,
    pub gemini_rate: f64,
    pub total_scans: i32,
    pub last_scan_at: DateTime<Utc>,
}
