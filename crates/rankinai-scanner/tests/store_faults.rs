mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rankinai_citation::CitationAnalyzer;
use rankinai_core::{
    NewAlert, NewEvent, NewOptimization, NewScan, Optimization, Platform, PricingTable, Product,
    ProductStatsUpdate, Scan, Shop,
};
use rankinai_scanner::{EngineSettings, MemoryStore, ScanEngine, ScanError, Store, StoreError};
use uuid::Uuid;

use common::{providers, settings, shop_with_product, ScriptedProvider, CITED_REPLY};

const STORE_TIMEOUT: Duration = Duration::from_millis(50);
const SLOW_ACK: Duration = Duration::from_millis(150);

/// Applies every write to the inner store, then misbehaves on the way back:
/// credit moves and scan inserts answer late, and the scan insert can report
/// an error after its row was committed.
struct LateAckStore {
    inner: Arc<MemoryStore>,
    error_after_insert: bool,
    refunds: AtomicUsize,
}

impl LateAckStore {
    fn new(inner: Arc<MemoryStore>, error_after_insert: bool) -> Arc<Self> {
        Arc::new(Self {
            inner,
            error_after_insert,
            refunds: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Store for LateAckStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn get_shop(&self, shop_id: i64) -> Result<Option<Shop>, StoreError> {
        self.inner.get_shop(shop_id).await
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        self.inner.get_product(product_id).await
    }

    async fn list_products_for_shop(&self, shop_id: i64) -> Result<Vec<Product>, StoreError> {
        self.inner.list_products_for_shop(shop_id).await
    }

    async fn try_debit_credits(
        &self,
        shop_id: i64,
        amount: i32,
    ) -> Result<Option<i32>, StoreError> {
        let result = self.inner.try_debit_credits(shop_id, amount).await;
        tokio::time::sleep(SLOW_ACK).await;
        result
    }

    async fn refund_credits(&self, shop_id: i64, amount: i32) -> Result<i32, StoreError> {
        let result = self.inner.refund_credits(shop_id, amount).await;
        self.refunds.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(SLOW_ACK).await;
        result
    }

    async fn insert_scan(&self, scan: &NewScan) -> Result<Scan, StoreError> {
        let result = self.inner.insert_scan(scan).await;
        tokio::time::sleep(SLOW_ACK).await;
        match result {
            Ok(_) if self.error_after_insert => {
                Err(StoreError::Backend("connection reset before commit ack".to_string()))
            }
            other => other,
        }
    }

    async fn find_scan_by_request_key(
        &self,
        request_key: Uuid,
    ) -> Result<Option<Scan>, StoreError> {
        self.inner.find_scan_by_request_key(request_key).await
    }

    async fn list_scans_for_product(&self, product_id: i64) -> Result<Vec<Scan>, StoreError> {
        self.inner.list_scans_for_product(product_id).await
    }

    async fn list_scans_for_shop(
        &self,
        shop_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Scan>, StoreError> {
        self.inner.list_scans_for_shop(shop_id, since).await
    }

    async fn update_product_stats(
        &self,
        product_id: i64,
        stats: &ProductStatsUpdate,
    ) -> Result<(), StoreError> {
        self.inner.update_product_stats(product_id, stats).await
    }

    async fn insert_optimization(
        &self,
        optimization: &NewOptimization,
    ) -> Result<Optimization, StoreError> {
        self.inner.insert_optimization(optimization).await
    }

    async fn get_optimization(
        &self,
        optimization_id: i64,
    ) -> Result<Option<Optimization>, StoreError> {
        self.inner.get_optimization(optimization_id).await
    }

    async fn mark_optimization_applied(
        &self,
        optimization_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Optimization>, StoreError> {
        self.inner.mark_optimization_applied(optimization_id, at).await
    }

    async fn mark_product_optimized(
        &self,
        product_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.mark_product_optimized(product_id, at).await
    }

    async fn insert_alert(&self, alert: &NewAlert) -> Result<(), StoreError> {
        self.inner.insert_alert(alert).await
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<(), StoreError> {
        self.inner.insert_event(event).await
    }

    async fn recharge_due_shops(&self, now: DateTime<Utc>) -> Result<Vec<Shop>, StoreError> {
        self.inner.recharge_due_shops(now).await
    }

    async fn reset_shop_to_trial(
        &self,
        domain: &str,
        trial_cap: i32,
    ) -> Result<Option<Shop>, StoreError> {
        self.inner.reset_shop_to_trial(domain, trial_cap).await
    }
}

fn tight_settings() -> EngineSettings {
    EngineSettings {
        store_timeout: STORE_TIMEOUT,
        ..settings()
    }
}

fn engine_over(store: Arc<LateAckStore>, chatgpt: Arc<ScriptedProvider>) -> ScanEngine {
    ScanEngine::new(
        store,
        providers(Some(chatgpt), None),
        CitationAnalyzer::default(),
        PricingTable::default(),
        tight_settings(),
    )
    .with_question_seed(7)
}

#[tokio::test]
async fn slow_commit_acks_still_charge_exactly_once() {
    let inner = Arc::new(MemoryStore::new());
    let (shop, product) = shop_with_product(&inner, 5);
    let store = LateAckStore::new(inner.clone(), false);
    let engine = engine_over(store.clone(), ScriptedProvider::always(CITED_REPLY));

    let outcome = engine.run_scan(product.id, Platform::ChatGpt).await.unwrap();

    assert_eq!(outcome.credits_remaining, 4);
    assert_eq!(inner.shop(shop.id).unwrap().credits, 4);
    assert_eq!(inner.scans().len(), 1);
    assert_eq!(store.refunds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn committed_scan_reported_as_failed_is_kept_and_charged() {
    let inner = Arc::new(MemoryStore::new());
    let (shop, product) = shop_with_product(&inner, 5);
    let store = LateAckStore::new(inner.clone(), true);
    let engine = engine_over(store.clone(), ScriptedProvider::always(CITED_REPLY));

    let outcome = engine.run_scan(product.id, Platform::ChatGpt).await.unwrap();

    let scans = inner.scans();
    assert_eq!(scans.len(), 1);
    assert_eq!(outcome.scan.id, scans[0].id);
    assert_eq!(inner.shop(shop.id).unwrap().credits, 4);
    assert_eq!(store.refunds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn slow_refund_returns_the_credit_once() {
    let inner = Arc::new(MemoryStore::new());
    let (shop, product) = shop_with_product(&inner, 5);
    let store = LateAckStore::new(inner.clone(), false);
    let engine = engine_over(store.clone(), ScriptedProvider::failing());

    let err = engine
        .run_scan(product.id, Platform::ChatGpt)
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::ProviderUnavailable { .. }));
    assert_eq!(inner.shop(shop.id).unwrap().credits, 5);
    assert_eq!(store.refunds.load(Ordering::SeqCst), 1);
    assert!(inner.scans().is_empty());
}

#[tokio::test]
async fn rejected_scan_insert_is_refunded() {
    let inner = Arc::new(MemoryStore::new());
    let (shop, product) = shop_with_product(&inner, 5);
    inner.reject_scan_writes(true);
    let store = LateAckStore::new(inner.clone(), false);
    let engine = engine_over(store.clone(), ScriptedProvider::always(CITED_REPLY));

    let err = engine
        .run_scan(product.id, Platform::ChatGpt)
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::PersistenceFailure(_)));
    assert_eq!(inner.shop(shop.id).unwrap().credits, 5);
    assert_eq!(store.refunds.load(Ordering::SeqCst), 1);
}
