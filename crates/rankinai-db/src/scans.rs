//! Database operations for the append-only `scans` table.

use chrono::{DateTime, Utc};
use rankinai_core::{NewScan, Scan, Sentiment};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SCAN_COLUMNS: &str = "id, product_id, shop_id, platform, question, response, is_cited, \
     citation_excerpt, citation_position, sentiment, competitors, missing_topics, \
     ignored_features, confidence, credits_used, duration_ms, prompt_tokens, \
     completion_tokens, request_key, created_at";

/// A row from the `scans` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRow {
    pub id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub platform: String,
    pub question: String,
    pub response: String,
    pub is_cited: bool,
    pub citation_excerpt: Option<String>,
    pub citation_position: Option<i32>,
    /// `NULL` whenever `is_cited` is false.
    pub sentiment: Option<String>,
    pub competitors: Vec<String>,
    pub missing_topics: Vec<String>,
    pub ignored_features: Vec<String>,
    pub confidence: f64,
    pub credits_used: i32,
    pub duration_ms: i64,
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub request_key: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ScanRow> for Scan {
    type Error = DbError;

    fn try_from(row: ScanRow) -> Result<Self, Self::Error> {
        Ok(Scan {
            id: row.id,
            product_id: row.product_id,
            shop_id: row.shop_id,
            platform: row.platform.parse()?,
            question: row.question,
            response: row.response,
            is_cited: row.is_cited,
            citation_excerpt: row.citation_excerpt,
            citation_position: row.citation_position,
            sentiment: row
                .sentiment
                .map(|s| s.parse::<Sentiment>())
                .transpose()?,
            competitors: row.competitors,
            missing_topics: row.missing_topics,
            ignored_features: row.ignored_features,
            confidence: row.confidence,
            credits_used: row.credits_used,
            duration_ms: row.duration_ms,
            prompt_tokens: row.prompt_tokens,
            completion_tokens: row.completion_tokens,
            request_key: row.request_key,
            created_at: row.created_at,
        })
    }
}

/// Appends a scan record and returns it with its assigned id and timestamp.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_scan(pool: &PgPool, scan: &NewScan) -> Result<Scan, DbError> {
    let row = sqlx::query_as::<_, ScanRow>(&format!(
        "INSERT INTO scans \
             (product_id, shop_id, platform, question, response, is_cited, \
              citation_excerpt, citation_position, sentiment, competitors, \
              missing_topics, ignored_features, confidence, credits_used, \
              duration_ms, prompt_tokens, completion_tokens, request_key) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         RETURNING {SCAN_COLUMNS}"
    ))
    .bind(scan.product_id)
    .bind(scan.shop_id)
    .bind(scan.platform.as_str())
    .bind(&scan.question)
    .bind(&scan.response)
    .bind(scan.is_cited)
    .bind(&scan.citation_excerpt)
    .bind(scan.citation_position)
    .bind(scan.sentiment.map(Sentiment::as_str))
    .bind(&scan.competitors)
    .bind(&scan.missing_topics)
    .bind(&scan.ignored_features)
    .bind(scan.confidence)
    .bind(scan.credits_used)
    .bind(scan.duration_ms)
    .bind(scan.prompt_tokens)
    .bind(scan.completion_tokens)
    .bind(scan.request_key)
    .fetch_one(pool)
    .await?;
    Scan::try_from(row)
}

/// Looks up the scan written under `request_key`, if that insert committed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_scan_by_request_key(
    pool: &PgPool,
    request_key: Uuid,
) -> Result<Option<Scan>, DbError> {
    let row = sqlx::query_as::<_, ScanRow>(&format!(
        "SELECT {SCAN_COLUMNS} FROM scans WHERE request_key = $1"
    ))
    .bind(request_key)
    .fetch_optional(pool)
    .await?;
    row.map(Scan::try_from).transpose()
}

/// Full scan history for a product, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scans_for_product(pool: &PgPool, product_id: i64) -> Result<Vec<Scan>, DbError> {
    let rows = sqlx::query_as::<_, ScanRow>(&format!(
        "SELECT {SCAN_COLUMNS} FROM scans WHERE product_id = $1 ORDER BY created_at, id"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Scan::try_from).collect()
}

/// Scans for every product of a shop, oldest first, optionally limited to
/// those created at or after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scans_for_shop(
    pool: &PgPool,
    shop_id: i64,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<Scan>, DbError> {
    let rows = sqlx::query_as::<_, ScanRow>(&format!(
        "SELECT {SCAN_COLUMNS} FROM scans \
         WHERE shop_id = $1 AND ($2::timestamptz IS NULL OR created_at >= $2) \
         ORDER BY created_at, id"
    ))
    .bind(shop_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Scan::try_from).collect()
}
