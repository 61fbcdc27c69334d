use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rankinai_core::{
    NewAlert, NewEvent, NewOptimization, NewScan, Optimization, Product, ProductStatsUpdate, Scan,
    Shop,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::error::StoreError;

/// [`Store`] backed by the `rankinai-db` query functions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        rankinai_db::ping(&self.pool)
            .await
            .map_err(|e| StoreError::Db(e.into()))
    }

    async fn get_shop(&self, shop_id: i64) -> Result<Option<Shop>, StoreError> {
        Ok(rankinai_db::get_shop(&self.pool, shop_id).await?)
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        Ok(rankinai_db::get_product(&self.pool, product_id).await?)
    }

    async fn list_products_for_shop(&self, shop_id: i64) -> Result<Vec<Product>, StoreError> {
        Ok(rankinai_db::list_products_for_shop(&self.pool, shop_id).await?)
    }

    async fn try_debit_credits(
        &self,
        shop_id: i64,
        amount: i32,
    ) -> Result<Option<i32>, StoreError> {
        Ok(rankinai_db::try_debit_credits(&self.pool, shop_id, amount).await?)
    }

    async fn refund_credits(&self, shop_id: i64, amount: i32) -> Result<i32, StoreError> {
        Ok(rankinai_db::refund_credits(&self.pool, shop_id, amount).await?)
    }

    async fn insert_scan(&self, scan: &NewScan) -> Result<Scan, StoreError> {
        Ok(rankinai_db::insert_scan(&self.pool, scan).await?)
    }

    async fn find_scan_by_request_key(
        &self,
        request_key: Uuid,
    ) -> Result<Option<Scan>, StoreError> {
        Ok(rankinai_db::find_scan_by_request_key(&self.pool, request_key).await?)
    }

    async fn list_scans_for_product(&self, product_id: i64) -> Result<Vec<Scan>, StoreError> {
        Ok(rankinai_db::list_scans_for_product(&self.pool, product_id).await?)
    }

    async fn list_scans_for_shop(
        &self,
        shop_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Scan>, StoreError> {
        Ok(rankinai_db::list_scans_for_shop(&self.pool, shop_id, since).await?)
    }

    async fn update_product_stats(
        &self,
        product_id: i64,
        stats: &ProductStatsUpdate,
    ) -> Result<(), StoreError> {
        Ok(rankinai_db::update_product_stats(&self.pool, product_id, stats).await?)
    }

    async fn insert_optimization(
        &self,
        optimization: &NewOptimization,
    ) -> Result<Optimization, StoreError> {
        Ok(rankinai_db::insert_optimization(&self.pool, optimization).await?)
    }

    async fn get_optimization(
        &self,
        optimization_id: i64,
    ) -> Result<Option<Optimization>, StoreError> {
        Ok(rankinai_db::get_optimization(&self.pool, optimization_id).await?)
    }

    async fn mark_optimization_applied(
        &self,
        optimization_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Optimization>, StoreError> {
        Ok(rankinai_db::mark_optimization_applied(&self.pool, optimization_id, at).await?)
    }

    async fn mark_product_optimized(
        &self,
        product_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(rankinai_db::mark_product_optimized(&self.pool, product_id, at).await?)
    }

    async fn insert_alert(&self, alert: &NewAlert) -> Result<(), StoreError> {
        rankinai_db::insert_alert(&self.pool, alert).await?;
        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<(), StoreError> {
        rankinai_db::insert_event(&self.pool, event).await?;
        Ok(())
    }

    async fn recharge_due_shops(&self, now: DateTime<Utc>) -> Result<Vec<Shop>, StoreError> {
        Ok(rankinai_db::recharge_due_shops(&self.pool, now).await?)
    }

    async fn reset_shop_to_trial(
        &self,
        domain: &str,
        trial_cap: i32,
    ) -> Result<Option<Shop>, StoreError> {
        Ok(rankinai_db::reset_shop_to_trial(&self.pool, domain, trial_cap).await?)
    }
}
