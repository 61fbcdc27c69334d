use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rankinai_core::{
    BillingInterval, NewAlert, NewEvent, NewOptimization, NewProduct, NewScan, Optimization, Plan,
    Product, ProductStatsUpdate, Scan, Shop,
};
use rankinai_db::DbError;
use uuid::Uuid;

use super::Store;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    shops: BTreeMap<i64, Shop>,
    products: BTreeMap<i64, Product>,
    scans: Vec<Scan>,
    optimizations: BTreeMap<i64, Optimization>,
    alerts: Vec<NewAlert>,
    events: Vec<NewEvent>,
    reject_scan_writes: bool,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process [`Store`] with the same observable semantics as
/// [`PgStore`](super::PgStore). Every operation holds one lock, so the
/// conditional credit debit is atomic here as well.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a shop on a monthly cycle whose cap equals `credits`.
    pub fn add_shop(&self, domain: &str, plan: Plan, credits: i32) -> Shop {
        let mut state = self.state();
        let now = Utc::now();
        let shop = Shop {
            id: state.allocate_id(),
            domain: domain.to_string(),
            plan,
            credits,
            credit_cap: credits,
            billing_interval: BillingInterval::Monthly,
            cycle_started_at: now,
            cycle_ends_at: now + BillingInterval::Monthly.cycle_length(),
            installed: true,
            created_at: now,
            updated_at: now,
        };
        state.shops.insert(shop.id, shop.clone());
        shop
    }

    pub fn add_product(&self, shop_id: i64, new: NewProduct) -> Product {
        let mut state = self.state();
        let now = Utc::now();
        let product = Product {
            id: state.allocate_id(),
            shop_id,
            external_id: new.external_id,
            title: new.title,
            handle: new.handle,
            description: new.description,
            vendor: new.vendor,
            product_type: new.product_type,
            category: new.category,
            price: new.price,
            tags: new.tags,
            citation_rate: 0.0,
            chatgpt_rate: 0.0,
            gemini_rate: 0.0,
            total_scans: 0,
            last_scan_at: None,
            last_optimized_at: None,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        product
    }

    /// Appends a historical scan without touching product statistics.
    pub fn seed_scan(&self, new: NewScan, created_at: DateTime<Utc>) -> Scan {
        let mut state = self.state();
        let scan = materialize_scan(state.allocate_id(), new, created_at);
        state.scans.push(scan.clone());
        scan
    }

    pub fn set_cycle_ends_at(&self, shop_id: i64, at: DateTime<Utc>) {
        if let Some(shop) = self.state().shops.get_mut(&shop_id) {
            shop.cycle_ends_at = at;
        }
    }

    /// Makes every subsequent `insert_scan` fail until switched off again.
    pub fn reject_scan_writes(&self, reject: bool) {
        self.state().reject_scan_writes = reject;
    }

    #[must_use]
    pub fn shop(&self, shop_id: i64) -> Option<Shop> {
        self.state().shops.get(&shop_id).cloned()
    }

    #[must_use]
    pub fn product(&self, product_id: i64) -> Option<Product> {
        self.state().products.get(&product_id).cloned()
    }

    #[must_use]
    pub fn scans(&self) -> Vec<Scan> {
        self.state().scans.clone()
    }

    #[must_use]
    pub fn optimizations(&self) -> Vec<Optimization> {
        self.state().optimizations.values().cloned().collect()
    }

    #[must_use]
    pub fn alerts(&self) -> Vec<NewAlert> {
        self.state().alerts.clone()
    }

    #[must_use]
    pub fn events(&self) -> Vec<NewEvent> {
        self.state().events.clone()
    }
}

fn materialize_scan(id: i64, new: NewScan, created_at: DateTime<Utc>) -> Scan {
    Scan {
        id,
        product_id: new.product_id,
        shop_id: new.shop_id,
        platform: new.platform,
        question: new.question,
        response: new.response,
        is_cited: new.is_cited,
        citation_excerpt: new.citation_excerpt,
        citation_position: new.citation_position,
        sentiment: new.sentiment,
        competitors: new.competitors,
        missing_topics: new.missing_topics,
        ignored_features: new.ignored_features,
        confidence: new.confidence,
        credits_used: new.credits_used,
        duration_ms: new.duration_ms,
        prompt_tokens: new.prompt_tokens,
        completion_tokens: new.completion_tokens,
        request_key: new.request_key,
        created_at,
    }
}

fn sorted_by_creation(mut scans: Vec<Scan>) -> Vec<Scan> {
    scans.sort_by_key(|s| (s.created_at, s.id));
    scans
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_shop(&self, shop_id: i64) -> Result<Option<Shop>, StoreError> {
        Ok(self.shop(shop_id))
    }

    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        Ok(self.product(product_id))
    }

    async fn list_products_for_shop(&self, shop_id: i64) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .state()
            .products
            .values()
            .filter(|p| p.shop_id == shop_id)
            .cloned()
            .collect())
    }

    async fn try_debit_credits(
        &self,
        shop_id: i64,
        amount: i32,
    ) -> Result<Option<i32>, StoreError> {
        let mut state = self.state();
        let Some(shop) = state.shops.get_mut(&shop_id) else {
            return Ok(None);
        };
        if shop.credits < amount {
            return Ok(None);
        }
        shop.credits -= amount;
        shop.updated_at = Utc::now();
        Ok(Some(shop.credits))
    }

    async fn refund_credits(&self, shop_id: i64, amount: i32) -> Result<i32, StoreError> {
        let mut state = self.state();
        let shop = state
            .shops
            .get_mut(&shop_id)
            .ok_or(StoreError::Db(DbError::NotFound))?;
        shop.credits += amount;
        shop.updated_at = Utc::now();
        Ok(shop.credits)
    }

    async fn insert_scan(&self, scan: &NewScan) -> Result<Scan, StoreError> {
        let mut state = self.state();
        if state.reject_scan_writes {
            return Err(StoreError::Backend("scan writes rejected".to_string()));
        }
        if state.scans.iter().any(|s| s.request_key == scan.request_key) {
            return Err(StoreError::Backend(format!(
                "duplicate scan request key {}",
                scan.request_key
            )));
        }
        // Creation times never go backwards, matching a single Postgres clock.
        let latest = state.scans.iter().map(|s| s.created_at).max();
        let created_at = latest.map_or_else(Utc::now, |l| l.max(Utc::now()));
        let stored = materialize_scan(state.allocate_id(), scan.clone(), created_at);
        state.scans.push(stored.clone());
        Ok(stored)
    }

    async fn find_scan_by_request_key(
        &self,
        request_key: Uuid,
    ) -> Result<Option<Scan>, StoreError> {
        Ok(self
            .state()
            .scans
            .iter()
            .find(|s| s.request_key == request_key)
            .cloned())
    }

    async fn list_scans_for_product(&self, product_id: i64) -> Result<Vec<Scan>, StoreError> {
        let scans = self
            .state()
            .scans
            .iter()
            .filter(|s| s.product_id == product_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(scans))
    }

    async fn list_scans_for_shop(
        &self,
        shop_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Scan>, StoreError> {
        let scans = self
            .state()
            .scans
            .iter()
            .filter(|s| s.shop_id == shop_id && since.is_none_or(|t| s.created_at >= t))
            .cloned()
            .collect();
        Ok(sorted_by_creation(scans))
    }

    async fn update_product_stats(
        &self,
        product_id: i64,
        stats: &ProductStatsUpdate,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::Db(DbError::NotFound))?;
        product.citation_rate = stats.citation_rate;
        product.chatgpt_rate = stats.chatgpt_rate;
        product.gemini_rate = stats.gemini_rate;
        product.total_scans = stats.total_scans;
        product.last_scan_at = Some(stats.last_scan_at);
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_optimization(
        &self,
        optimization: &NewOptimization,
    ) -> Result<Optimization, StoreError> {
        let mut state = self.state();
        let stored = Optimization {
            id: state.allocate_id(),
            product_id: optimization.product_id,
            shop_id: optimization.shop_id,
            suggestions: optimization.suggestions.clone(),
            quick_wins: optimization.quick_wins.clone(),
            current_score: optimization.current_score,
            potential_score: optimization.potential_score,
            source: optimization.source,
            applied: false,
            applied_at: None,
            created_at: Utc::now(),
        };
        state.optimizations.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_optimization(
        &self,
        optimization_id: i64,
    ) -> Result<Option<Optimization>, StoreError> {
        Ok(self.state().optimizations.get(&optimization_id).cloned())
    }

    async fn mark_optimization_applied(
        &self,
        optimization_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Optimization>, StoreError> {
        let mut state = self.state();
        Ok(state
            .optimizations
            .get_mut(&optimization_id)
            .filter(|o| !o.applied)
            .map(|o| {
                o.applied = true;
                o.applied_at = Some(at);
                o.clone()
            }))
    }

    async fn mark_product_optimized(
        &self,
        product_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(StoreError::Db(DbError::NotFound))?;
        product.last_optimized_at = Some(at);
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_alert(&self, alert: &NewAlert) -> Result<(), StoreError> {
        self.state().alerts.push(alert.clone());
        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<(), StoreError> {
        self.state().events.push(event.clone());
        Ok(())
    }

    async fn recharge_due_shops(&self, now: DateTime<Utc>) -> Result<Vec<Shop>, StoreError> {
        let mut state = self.state();
        let mut recharged = Vec::new();
        for shop in state.shops.values_mut() {
            if !shop.installed || shop.cycle_ends_at > now {
                continue;
            }
            shop.credits = shop.credit_cap;
            shop.cycle_started_at = now;
            shop.cycle_ends_at = now + shop.billing_interval.cycle_length();
            shop.updated_at = Utc::now();
            recharged.push(shop.clone());
        }
        Ok(recharged)
    }

    async fn reset_shop_to_trial(
        &self,
        domain: &str,
        trial_cap: i32,
    ) -> Result<Option<Shop>, StoreError> {
        let mut state = self.state();
        Ok(state
            .shops
            .values_mut()
            .find(|s| s.domain == domain)
            .map(|shop| {
                shop.plan = Plan::Trial;
                shop.credits = 0;
                shop.credit_cap = trial_cap;
                shop.installed = false;
                shop.updated_at = Utc::now();
                shop.clone()
            }))
    }
}
