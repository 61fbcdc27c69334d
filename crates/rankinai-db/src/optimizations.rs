//! Database operations for `optimizations`.

use chrono::{DateTime, Utc};
use rankinai_core::{NewOptimization, Optimization, Suggestions};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

const OPTIMIZATION_COLUMNS: &str = "id, product_id, shop_id, suggestions, quick_wins, \
     current_score, potential_score, source, applied, applied_at, created_at";

/// A row from the `optimizations` table. `suggestions` is JSONB.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OptimizationRow {
    pub id: i64,
    pub product_id: i64,
    pub shop_id: i64,
    pub suggestions: Json<Suggestions>,
    pub quick_wins: Vec<String>,
    pub current_score: f64,
    pub potential_score: f64,
    pub source: String,
    pub applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OptimizationRow> for Optimization {
    type Error = DbError;

    fn try_from(row: OptimizationRow) -> Result<Self, Self::Error> {
        Ok(Optimization {
            id: row.id,
            product_id: row.product_id,
            shop_id: row.shop_id,
            suggestions: row.suggestions.0,
            quick_wins: row.quick_wins,
            current_score: row.current_score,
            potential_score: row.potential_score,
            source: row.source.parse()?,
            applied: row.applied,
            applied_at: row.applied_at,
            created_at: row.created_at,
        })
    }
}

/// Inserts a recommendation bundle.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_optimization(
    pool: &PgPool,
    optimization: &NewOptimization,
) -> Result<Optimization, DbError> {
    let row = sqlx::query_as::<_, OptimizationRow>(&format!(
        "INSERT INTO optimizations \
             (product_id, shop_id, suggestions, quick_wins, current_score, \
              potential_score, source) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING {OPTIMIZATION_COLUMNS}"
    ))
    .bind(optimization.product_id)
    .bind(optimization.shop_id)
    .bind(Json(&optimization.suggestions))
    .bind(&optimization.quick_wins)
    .bind(optimization.current_score)
    .bind(optimization.potential_score)
    .bind(optimization.source.as_str())
    .fetch_one(pool)
    .await?;
    Optimization::try_from(row)
}

/// Fetches an optimization by primary key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_optimization(
    pool: &PgPool,
    optimization_id: i64,
) -> Result<Option<Optimization>, DbError> {
    let row = sqlx::query_as::<_, OptimizationRow>(&format!(
        "SELECT {OPTIMIZATION_COLUMNS} FROM optimizations WHERE id = $1"
    ))
    .bind(optimization_id)
    .fetch_optional(pool)
    .await?;
    row.map(Optimization::try_from).transpose()
}

/// Flips `applied` to true exactly once.
///
/// Returns `None` when the row is missing or already applied; the caller
/// distinguishes the two with [`get_optimization`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_optimization_applied(
    pool: &PgPool,
    optimization_id: i64,
    at: DateTime<Utc>,
) -> Result<Option<Optimization>, DbError> {
    let row = sqlx::query_as::<_, OptimizationRow>(&format!(
        "UPDATE optimizations SET applied = TRUE, applied_at = $2 \
         WHERE id = $1 AND applied = FALSE \
         RETURNING {OPTIMIZATION_COLUMNS}"
    ))
    .bind(optimization_id)
    .bind(at)
    .fetch_optional(pool)
    .await?;
    row.map(Optimization::try_from).transpose()
}
