//! Database operations for `alerts` and the `events` audit log.

use chrono::{DateTime, Utc};
use rankinai_core::{NewAlert, NewEvent};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: i64,
    pub shop_id: i64,
    pub product_id: Option<i64>,
    pub kind: String,
    pub message: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Records an alert. Returns the new row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_alert(pool: &PgPool, alert: &NewAlert) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO alerts (shop_id, product_id, kind, message, metadata) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id",
    )
    .bind(alert.shop_id)
    .bind(alert.product_id)
    .bind(alert.kind.as_str())
    .bind(&alert.message)
    .bind(&alert.metadata)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Appends an audit event. Returns the new row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_event(pool: &PgPool, event: &NewEvent) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO events (shop_id, product_id, kind, payload) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(event.shop_id)
    .bind(event.product_id)
    .bind(event.kind.as_str())
    .bind(&event.payload)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Most recent alerts for a shop, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_alerts(pool: &PgPool, shop_id: i64, limit: i64) -> Result<Vec<AlertRow>, DbError> {
    let rows = sqlx::query_as::<_, AlertRow>(
        "SELECT id, shop_id, product_id, kind, message, metadata, created_at \
         FROM alerts WHERE shop_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(shop_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
