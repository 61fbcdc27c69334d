//! Persistence seam for the scan pipeline.
//!
//! [`Store`] lists every read and write the orchestrator, aggregation engine
//! and shop lifecycle jobs perform. [`PgStore`] backs it with Postgres;
//! [`MemoryStore`] keeps everything in process for tests and local runs.

mod memory;
mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rankinai_core::{
    NewAlert, NewEvent, NewOptimization, NewScan, Optimization, Product, ProductStatsUpdate, Scan,
    Shop,
};

use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::StoreError;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness check for health endpoints.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn get_shop(&self, shop_id: i64) -> Result<Option<Shop>, StoreError>;

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, StoreError>;

    async fn list_products_for_shop(&self, shop_id: i64) -> Result<Vec<Product>, StoreError>;

    /// Conditional decrement: debits only when the balance covers `amount`.
    /// Returns the new balance, or `None` when it does not.
    async fn try_debit_credits(&self, shop_id: i64, amount: i32)
        -> Result<Option<i32>, StoreError>;

    /// Returns the new balance.
    async fn refund_credits(&self, shop_id: i64, amount: i32) -> Result<i32, StoreError>;

    /// Rejects a second insert with the same `request_key`.
    async fn insert_scan(&self, scan: &NewScan) -> Result<Scan, StoreError>;

    async fn find_scan_by_request_key(&self, request_key: Uuid)
        -> Result<Option<Scan>, StoreError>;

    /// Oldest first.
    async fn list_scans_for_product(&self, product_id: i64) -> Result<Vec<Scan>, StoreError>;

    /// Oldest first, limited to scans created at or after `since`.
    async fn list_scans_for_shop(
        &self,
        shop_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Scan>, StoreError>;

    async fn update_product_stats(
        &self,
        product_id: i64,
        stats: &ProductStatsUpdate,
    ) -> Result<(), StoreError>;

    async fn insert_optimization(
        &self,
        optimization: &NewOptimization,
    ) -> Result<Optimization, StoreError>;

    async fn get_optimization(&self, optimization_id: i64)
        -> Result<Option<Optimization>, StoreError>;

    /// Flips `applied` once; `None` when missing or already applied.
    async fn mark_optimization_applied(
        &self,
        optimization_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Optimization>, StoreError>;

    async fn mark_product_optimized(
        &self,
        product_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn insert_alert(&self, alert: &NewAlert) -> Result<(), StoreError>;

    async fn insert_event(&self, event: &NewEvent) -> Result<(), StoreError>;

    async fn recharge_due_shops(&self, now: DateTime<Utc>) -> Result<Vec<Shop>, StoreError>;

    async fn reset_shop_to_trial(
        &self,
        domain: &str,
        trial_cap: i32,
    ) -> Result<Option<Shop>, StoreError>;
}

/// Await `fut` for at most `limit`, mapping expiry to [`StoreError::Timeout`].
///
/// Only for reads and writes that are safe to abandon. Expiry drops the
/// future without knowing whether the store applied it, so credit moves and
/// scan inserts are awaited to completion instead.
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or(Err(StoreError::Timeout))
}
