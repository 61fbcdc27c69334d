//! Database operations for `shops`, including the atomic credit primitives.

use chrono::{DateTime, Utc};
use rankinai_core::{BillingInterval, Plan, Shop};
use sqlx::PgPool;

use crate::DbError;

const SHOP_COLUMNS: &str = "id, domain, plan, credits, credit_cap, billing_interval, \
     cycle_started_at, cycle_ends_at, installed, created_at, updated_at";

/// A row from the `shops` table. Enum columns are stored as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopRow {
    pub id: i64,
    pub domain: String,
    pub plan: String,
    pub credits: i32,
    pub credit_cap: i32,
    pub billing_interval: String,
    pub cycle_started_at: DateTime<Utc>,
    pub cycle_ends_at: DateTime<Utc>,
    pub installed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = DbError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        Ok(Shop {
            id: row.id,
            domain: row.domain,
            plan: row.plan.parse()?,
            credits: row.credits,
            credit_cap: row.credit_cap,
            billing_interval: row.billing_interval.parse()?,
            cycle_started_at: row.cycle_started_at,
            cycle_ends_at: row.cycle_ends_at,
            installed: row.installed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fetches a shop by primary key. Returns `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or [`DbError::InvalidValue`]
/// if a stored enum column does not parse.
pub async fn get_shop(pool: &PgPool, shop_id: i64) -> Result<Option<Shop>, DbError> {
    let row = sqlx::query_as::<_, ShopRow>(&format!(
        "SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1"
    ))
    .bind(shop_id)
    .fetch_optional(pool)
    .await?;
    row.map(Shop::try_from).transpose()
}

/// Fetches a shop by storefront domain.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_shop_by_domain(pool: &PgPool, domain: &str) -> Result<Option<Shop>, DbError> {
    let row = sqlx::query_as::<_, ShopRow>(&format!(
        "SELECT {SHOP_COLUMNS} FROM shops WHERE domain = $1"
    ))
    .bind(domain)
    .fetch_optional(pool)
    .await?;
    row.map(Shop::try_from).transpose()
}

/// Creates or re-activates a shop on install.
///
/// Conflicts on `domain` reset the plan, fill the balance to `credit_cap`
/// and start a fresh cycle.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn install_shop(
    pool: &PgPool,
    domain: &str,
    plan: Plan,
    billing_interval: BillingInterval,
    credit_cap: i32,
) -> Result<Shop, DbError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, ShopRow>(&format!(
        "INSERT INTO shops \
             (domain, plan, credits, credit_cap, billing_interval, \
              cycle_started_at, cycle_ends_at, installed) \
         VALUES ($1, $2, $3, $3, $4, $5, $6, TRUE) \
         ON CONFLICT (domain) DO UPDATE SET \
             plan             = EXCLUDED.plan, \
             credits          = EXCLUDED.credits, \
             credit_cap       = EXCLUDED.credit_cap, \
             billing_interval = EXCLUDED.billing_interval, \
             cycle_started_at = EXCLUDED.cycle_started_at, \
             cycle_ends_at    = EXCLUDED.cycle_ends_at, \
             installed        = TRUE, \
             updated_at       = NOW() \
         RETURNING {SHOP_COLUMNS}"
    ))
    .bind(domain)
    .bind(plan.as_str())
    .bind(credit_cap)
    .bind(billing_interval.as_str())
    .bind(now)
    .bind(now + billing_interval.cycle_length())
    .fetch_one(pool)
    .await?;
    Shop::try_from(row)
}

/// Atomically debits `amount` credits if the balance covers it.
///
/// Check and decrement are one conditional `UPDATE`, so concurrent callers
/// can never drive the balance negative. Returns the new balance, or `None`
/// when the shop is missing or the balance is too low.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn try_debit_credits(
    pool: &PgPool,
    shop_id: i64,
    amount: i32,
) -> Result<Option<i32>, DbError> {
    let remaining = sqlx::query_scalar::<_, i32>(
        "UPDATE shops SET credits = credits - $2, updated_at = NOW() \
         WHERE id = $1 AND credits >= $2 \
         RETURNING credits",
    )
    .bind(shop_id)
    .bind(amount)
    .fetch_optional(pool)
    .await?;
    Ok(remaining)
}

/// Returns `amount` credits to the shop. Returns the new balance.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the shop does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn refund_credits(pool: &PgPool, shop_id: i64, amount: i32) -> Result<i32, DbError> {
    sqlx::query_scalar::<_, i32>(
        "UPDATE shops SET credits = credits + $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING credits",
    )
    .bind(shop_id)
    .bind(amount)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Refills every installed shop whose cycle has ended and advances its
/// cycle window by the billing interval. Returns the recharged shops.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn recharge_due_shops(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<Shop>, DbError> {
    let rows = sqlx::query_as::<_, ShopRow>(&format!(
        "UPDATE shops SET \
             credits          = credit_cap, \
             cycle_started_at = $1, \
             cycle_ends_at    = $1 + CASE billing_interval \
                                         WHEN 'YEARLY' THEN INTERVAL '365 days' \
                                         ELSE INTERVAL '30 days' \
                                     END, \
             updated_at       = NOW() \
         WHERE installed AND cycle_ends_at <= $1 \
         RETURNING {SHOP_COLUMNS}"
    ))
    .bind(now)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Shop::try_from).collect()
}

/// Soft-resets a shop on uninstall or cancellation: TRIAL plan, zero
/// credits, not installed. `trial_cap` becomes the cap applied on the next
/// install. Returns `None` if the domain is unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn reset_shop_to_trial(
    pool: &PgPool,
    domain: &str,
    trial_cap: i32,
) -> Result<Option<Shop>, DbError> {
    let row = sqlx::query_as::<_, ShopRow>(&format!(
        "UPDATE shops SET \
             plan       = 'TRIAL', \
             credits    = 0, \
             credit_cap = $2, \
             installed  = FALSE, \
             updated_at = NOW() \
         WHERE domain = $1 \
         RETURNING {SHOP_COLUMNS}"
    ))
    .bind(domain)
    .bind(trial_cap)
    .fetch_optional(pool)
    .await?;
    row.map(Shop::try_from).transpose()
}
