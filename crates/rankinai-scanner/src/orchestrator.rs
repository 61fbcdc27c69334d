//! Scan orchestration.
//!
//! [`ScanEngine`] is the single entry point for the caller-facing
//! operations. A scan reserves credits before the assistant is called,
//! refunds them on any failure, and only commits once the scan row exists.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rankinai_citation::{generate_question, AnalyzerConfig, CitationAnalyzer, Listing, SYSTEM_PROMPT};
use rankinai_core::{
    AnalyticsWindow, AppConfig, EventKind, NewOptimization, NewScan, Optimization, Platform,
    PricingTable, Product, ProductStatsUpdate, RecommendationSource, Scan, Shop,
};
use rankinai_llm::{GeminiClient, LlmError, LlmProvider, OpenAiClient};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::aggregation::{self, ProductStats, ShopAnalytics};
use crate::alerts::{self, citation_drop_alert, detect_new_citation_drop, low_credit_alert};
use crate::credits::CreditReservation;
use crate::error::{ScanError, StoreError};
use crate::recommendations::{
    build_prompt, fallback_recommendation, parse_recommendation, Recommendation,
    RECOMMENDATION_SYSTEM_PROMPT,
};
use crate::store::{bounded, Store};

/// Slack added on top of the adapters' own per-attempt timeouts and retries.
const LLM_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Configured assistant per platform. A missing entry makes that platform
/// unavailable without affecting the other.
#[derive(Clone, Default)]
pub struct Providers {
    chatgpt: Option<Arc<dyn LlmProvider>>,
    gemini: Option<Arc<dyn LlmProvider>>,
}

impl Providers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, platform: Platform, provider: Arc<dyn LlmProvider>) -> Self {
        match platform {
            Platform::ChatGpt => self.chatgpt = Some(provider),
            Platform::Gemini => self.gemini = Some(provider),
        }
        self
    }

    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<&Arc<dyn LlmProvider>> {
        match platform {
            Platform::ChatGpt => self.chatgpt.as_ref(),
            Platform::Gemini => self.gemini.as_ref(),
        }
    }

    /// Build clients for every platform with an API key.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if a configured client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, LlmError> {
        let mut providers = Self::new();
        if let Some(client) = OpenAiClient::from_app_config(config)? {
            providers = providers.with(Platform::ChatGpt, Arc::new(client));
        }
        if let Some(client) = GeminiClient::from_app_config(config)? {
            providers = providers.with(Platform::Gemini, Arc::new(client));
        }
        Ok(providers)
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers")
            .field("chatgpt", &self.chatgpt.as_ref().map(|p| p.name()))
            .field("gemini", &self.gemini.as_ref().map(|p| p.name()))
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Bound on one assistant call, retries included.
    pub llm_timeout: Duration,
    /// Bound on each store call.
    pub store_timeout: Duration,
    pub low_credit_threshold: i32,
    /// Percentage points.
    pub citation_drop_threshold: f64,
    /// Asked first for recommendations; the other platform is the backup.
    pub recommendation_platform: Platform,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(95),
            store_timeout: Duration::from_secs(10),
            low_credit_threshold: 10,
            citation_drop_threshold: 15.0,
            recommendation_platform: Platform::ChatGpt,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let attempts = u64::from(config.llm_max_retries) + 1;
        Self {
            llm_timeout: Duration::from_secs(config.llm_timeout_secs.saturating_mul(attempts))
                + LLM_TIMEOUT_SLACK,
            store_timeout: Duration::from_secs(config.store_timeout_secs),
            low_credit_threshold: config.low_credit_threshold,
            citation_drop_threshold: config.citation_drop_threshold,
            ..Self::default()
        }
    }
}

/// A persisted scan plus what it changed.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub scan: Scan,
    /// `None` when the refresh failed; the scan is still stored and charged.
    pub stats: Option<ProductStatsUpdate>,
    pub credits_remaining: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformScan {
    Completed(ScanOutcome),
    Failed { code: &'static str, message: String },
}

impl PlatformScan {
    fn from_result(result: Result<ScanOutcome, ScanError>) -> Self {
        match result {
            Ok(outcome) => PlatformScan::Completed(outcome),
            Err(err) => PlatformScan::Failed {
                code: err.code(),
                message: err.to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, PlatformScan::Completed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteScanOutcome {
    pub chatgpt: PlatformScan,
    pub gemini: PlatformScan,
    /// `None` only when both platform scans failed.
    pub recommendations: Option<Optimization>,
}

pub struct ScanEngine {
    store: Arc<dyn Store>,
    providers: Providers,
    analyzer: CitationAnalyzer,
    pricing: PricingTable,
    settings: EngineSettings,
    rng: Mutex<StdRng>,
}

impl ScanEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        providers: Providers,
        analyzer: CitationAnalyzer,
        pricing: PricingTable,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            providers,
            analyzer,
            pricing,
            settings,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Engine wired from application config: clients for every configured
    /// platform, the configured competitor mode and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] if a configured client cannot be constructed.
    pub fn from_app_config(
        store: Arc<dyn Store>,
        config: &AppConfig,
        pricing: PricingTable,
    ) -> Result<Self, LlmError> {
        let analyzer = CitationAnalyzer::new(AnalyzerConfig {
            competitor_mode: config.competitor_mode,
            ..AnalyzerConfig::default()
        });
        Ok(Self::new(
            store,
            Providers::from_app_config(config)?,
            analyzer,
            pricing,
            EngineSettings::from_app_config(config),
        ))
    }

    /// Make question selection reproducible.
    #[must_use]
    pub fn with_question_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    #[must_use]
    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    async fn load_product(&self, product_id: i64) -> Result<Product, ScanError> {
        bounded(self.settings.store_timeout, self.store.get_product(product_id))
            .await?
            .ok_or(ScanError::ProductNotFound(product_id))
    }

    async fn load_shop(&self, shop_id: i64) -> Result<Shop, ScanError> {
        bounded(self.settings.store_timeout, self.store.get_shop(shop_id))
            .await?
            .ok_or(ScanError::ShopNotFound(shop_id))
    }

    fn next_question(&self, product: &Product) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        generate_question(
            product.product_type.as_deref(),
            product.vendor.as_deref(),
            product.category.as_deref(),
            &mut *rng,
        )
    }

    async fn record_event(
        &self,
        product: &Product,
        kind: EventKind,
        payload: serde_json::Value,
    ) {
        let event = alerts::event(product.shop_id, Some(product.id), kind, payload);
        alerts::emit_event(self.store.as_ref(), event, self.settings.store_timeout).await;
    }

    async fn check_low_credits(&self, reservation: &CreditReservation) {
        let threshold = self.settings.low_credit_threshold;
        if alerts::crosses_low_credit_threshold(
            reservation.balance_before(),
            reservation.balance_after(),
            threshold,
        ) {
            tracing::warn!(
                shop_id = reservation.shop_id(),
                balance = reservation.balance_after(),
                threshold,
                "shop credits running low"
            );
            let alert = low_credit_alert(reservation.shop_id(), reservation.balance_after(), threshold);
            alerts::emit_alert(self.store.as_ref(), alert, self.settings.store_timeout).await;
        }
    }

    /// Refund, record the failure and hand back `error` for the caller.
    async fn abandon_scan(
        &self,
        reservation: CreditReservation,
        product: &Product,
        platform: Platform,
        error: ScanError,
    ) -> ScanError {
        let refunded = reservation.refund(self.store.as_ref()).await.is_ok();
        tracing::warn!(
            product_id = product.id,
            platform = %platform,
            refunded,
            error = %error,
            "scan failed"
        );
        self.record_event(
            product,
            EventKind::ScanFailed,
            json!({
                "platform": platform,
                "code": error.code(),
                "error": error.to_string(),
                "refunded": refunded,
            }),
        )
        .await;
        error
    }

    /// Insert the scan row, awaiting it to completion.
    ///
    /// An error does not prove the row is absent, so the request key is
    /// looked up before the caller refunds.
    async fn persist_scan(&self, new_scan: &NewScan) -> Result<Scan, StoreError> {
        let err = match self.store.insert_scan(new_scan).await {
            Ok(scan) => return Ok(scan),
            Err(err) => err,
        };
        let lookup = bounded(
            self.settings.store_timeout,
            self.store.find_scan_by_request_key(new_scan.request_key),
        )
        .await;
        match lookup {
            Ok(Some(scan)) => {
                tracing::warn!(
                    product_id = new_scan.product_id,
                    scan_id = scan.id,
                    error = %err,
                    "scan insert reported an error but the row was committed"
                );
                Ok(scan)
            }
            Ok(None) => Err(err),
            Err(lookup_err) => {
                tracing::warn!(
                    product_id = new_scan.product_id,
                    error = %lookup_err,
                    "could not confirm whether the failed scan insert committed"
                );
                Err(err)
            }
        }
    }

    /// Load the full history, recompute the cached stats and write them.
    async fn recompute(
        &self,
        product_id: i64,
    ) -> Result<(ProductStatsUpdate, Vec<Scan>), StoreError> {
        let limit = self.settings.store_timeout;
        let history = bounded(limit, self.store.list_scans_for_product(product_id)).await?;
        let stats = aggregation::compute_product_stats(&history, Utc::now());
        bounded(limit, self.store.update_product_stats(product_id, &stats)).await?;
        Ok((stats, history))
    }

    /// Recompute a product's cached rates from its full scan history.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ProductNotFound`] or
    /// [`ScanError::PersistenceFailure`].
    pub async fn recompute_product_stats(
        &self,
        product_id: i64,
    ) -> Result<ProductStatsUpdate, ScanError> {
        let product = self.load_product(product_id).await?;
        let (stats, _) = self.recompute(product.id).await?;
        Ok(stats)
    }

    /// Scan one product on one platform.
    ///
    /// A reply that does not mention the product is a successful scan with
    /// `is_cited = false`. A stats refresh failure after the scan is stored
    /// is logged and reported as `stats: None`; the credit stays spent.
    ///
    /// # Errors
    ///
    /// - [`ScanError::ProviderUnavailable`] when the platform has no client,
    ///   fails or times out (credit refunded)
    /// - [`ScanError::InsufficientCredits`] before any external call
    /// - [`ScanError::ProductNotFound`] / [`ScanError::ShopNotFound`]
    /// - [`ScanError::PersistenceFailure`] when the scan cannot be stored
    ///   (credit refunded)
    pub async fn run_scan(
        &self,
        product_id: i64,
        platform: Platform,
    ) -> Result<ScanOutcome, ScanError> {
        let provider = self
            .providers
            .get(platform)
            .cloned()
            .ok_or_else(|| ScanError::ProviderUnavailable {
                platform,
                reason: "no API key configured".to_string(),
            })?;
        let product = self.load_product(product_id).await?;
        let shop = self.load_shop(product.shop_id).await?;
        let question = self.next_question(&product);
        let limit = self.settings.store_timeout;

        // Step 1: Reserve the credit before anything leaves the process.
        let reservation =
            CreditReservation::reserve(self.store.as_ref(), &shop, self.pricing.scan_cost, limit)
                .await?;
        self.check_low_credits(&reservation).await;

        // Step 2: Ask the assistant.
        let started = Instant::now();
        let reply = match tokio::time::timeout(
            self.settings.llm_timeout,
            provider.send(SYSTEM_PROMPT, &question),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                let error = ScanError::ProviderUnavailable {
                    platform,
                    reason: err.to_string(),
                };
                return Err(self.abandon_scan(reservation, &product, platform, error).await);
            }
            Err(_) => {
                let error = ScanError::ProviderUnavailable {
                    platform,
                    reason: format!(
                        "no reply within {}s",
                        self.settings.llm_timeout.as_secs()
                    ),
                };
                return Err(self.abandon_scan(reservation, &product, platform, error).await);
            }
        };
        let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        // Step 3: Analyze and persist.
        let verdict = self
            .analyzer
            .analyze(&reply.text, &Listing::from(&product), platform);
        let usage = reply.usage;
        let new_scan = NewScan {
            product_id: product.id,
            shop_id: product.shop_id,
            platform,
            question,
            response: reply.text,
            is_cited: verdict.is_cited,
            citation_excerpt: verdict.excerpt,
            citation_position: verdict.position.and_then(|p| i32::try_from(p).ok()),
            sentiment: verdict.sentiment,
            competitors: verdict.competitors,
            missing_topics: verdict.missing_topics,
            ignored_features: verdict.ignored_features,
            confidence: verdict.confidence,
            credits_used: reservation.amount(),
            duration_ms,
            prompt_tokens: usage.map(|u| i32::try_from(u.prompt_tokens).unwrap_or(i32::MAX)),
            completion_tokens: usage
                .map(|u| i32::try_from(u.completion_tokens).unwrap_or(i32::MAX)),
            request_key: Uuid::new_v4(),
        };

        let scan = match self.persist_scan(&new_scan).await {
            Ok(scan) => scan,
            Err(err) => {
                let error = ScanError::PersistenceFailure(err);
                return Err(self.abandon_scan(reservation, &product, platform, error).await);
            }
        };
        let credits_remaining = reservation.commit();

        // Step 4: Refresh cached stats. The scan is the system of record, so a
        // failure here is not a scan failure.
        let stats = match self.recompute(product.id).await {
            Ok((stats, history)) => {
                if let Some(drop) =
                    detect_new_citation_drop(&history, self.settings.citation_drop_threshold)
                {
                    tracing::warn!(
                        product_id = product.id,
                        drop = drop.drop,
                        "citation rate dropped"
                    );
                    let alert = citation_drop_alert(&product, &drop);
                    alerts::emit_alert(self.store.as_ref(), alert, limit).await;
                }
                Some(stats)
            }
            Err(err) => {
                tracing::warn!(
                    product_id = product.id,
                    scan_id = scan.id,
                    error = %err,
                    "product stats refresh failed after scan was stored"
                );
                None
            }
        };

        tracing::info!(
            product_id = product.id,
            platform = %platform,
            scan_id = scan.id,
            cited = scan.is_cited,
            duration_ms,
            credits_remaining,
            "scan completed"
        );
        self.record_event(
            &product,
            EventKind::ScanCompleted,
            json!({
                "scan_id": scan.id,
                "platform": platform,
                "is_cited": scan.is_cited,
                "credits_used": scan.credits_used,
            }),
        )
        .await;

        Ok(ScanOutcome {
            scan,
            stats,
            credits_remaining,
        })
    }

    /// Scan on every platform, then generate recommendations.
    ///
    /// One platform failing does not stop the other. Recommendations are
    /// produced whenever at least one scan completed: charged when the LLM
    /// path succeeds, free when the shop cannot cover them or the template
    /// is used.
    ///
    /// # Errors
    ///
    /// - [`ScanError::ProductNotFound`] before any scan
    /// - [`ScanError::InsufficientCredits`] when neither platform could be
    ///   paid for
    pub async fn run_complete_scan(
        &self,
        product_id: i64,
    ) -> Result<CompleteScanOutcome, ScanError> {
        let product = self.load_product(product_id).await?;

        let chatgpt = self.run_scan(product.id, Platform::ChatGpt).await;
        let gemini = self.run_scan(product.id, Platform::Gemini).await;
        let (chatgpt, gemini) = match (chatgpt, gemini) {
            (
                Err(err @ ScanError::InsufficientCredits { .. }),
                Err(ScanError::InsufficientCredits { .. }),
            ) => return Err(err),
            (chatgpt, gemini) => (
                PlatformScan::from_result(chatgpt),
                PlatformScan::from_result(gemini),
            ),
        };

        let recommendations = if chatgpt.is_completed() || gemini.is_completed() {
            self.recommend_after_scans(product.id).await
        } else {
            tracing::warn!(product_id, "both platform scans failed, skipping recommendations");
            None
        };

        Ok(CompleteScanOutcome {
            chatgpt,
            gemini,
            recommendations,
        })
    }

    async fn recommend_after_scans(&self, product_id: i64) -> Option<Optimization> {
        // Reload for the rates the scans just refreshed.
        let loaded = match self.load_product(product_id).await {
            Ok(product) => self
                .load_shop(product.shop_id)
                .await
                .map(|shop| (product, shop)),
            Err(err) => Err(err),
        };
        let (product, shop) = match loaded {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(product_id, error = %err, "could not load product for recommendations");
                return None;
            }
        };

        let reservation = match CreditReservation::reserve(
            self.store.as_ref(),
            &shop,
            self.pricing.recommendation_cost,
            self.settings.store_timeout,
        )
        .await
        {
            Ok(reservation) => {
                self.check_low_credits(&reservation).await;
                Some(reservation)
            }
            Err(err) => {
                tracing::info!(product_id, reason = %err, "recommendations fall back to template");
                None
            }
        };

        match self.produce_recommendations(&product, reservation).await {
            Ok(optimization) => Some(optimization),
            Err(err) => {
                tracing::warn!(product_id, error = %err, "recommendation generation failed");
                None
            }
        }
    }

    /// Generate and store a recommendation bundle for a product.
    ///
    /// Costs one credit when the assistant produces a usable bundle. When
    /// it fails the template bundle is returned and the credit refunded.
    ///
    /// # Errors
    ///
    /// - [`ScanError::InsufficientCredits`] when the shop cannot cover it
    /// - [`ScanError::ProductNotFound`] / [`ScanError::ShopNotFound`]
    /// - [`ScanError::PersistenceFailure`] when the bundle cannot be stored
    pub async fn generate_recommendations(
        &self,
        product_id: i64,
    ) -> Result<Optimization, ScanError> {
        let product = self.load_product(product_id).await?;
        let shop = self.load_shop(product.shop_id).await?;
        let reservation = CreditReservation::reserve(
            self.store.as_ref(),
            &shop,
            self.pricing.recommendation_cost,
            self.settings.store_timeout,
        )
        .await?;
        self.check_low_credits(&reservation).await;
        self.produce_recommendations(&product, Some(reservation)).await
    }

    /// The LLM path runs only with a reservation; without one the template
    /// is used and nothing is charged.
    async fn produce_recommendations(
        &self,
        product: &Product,
        reservation: Option<CreditReservation>,
    ) -> Result<Optimization, ScanError> {
        let limit = self.settings.store_timeout;
        let history = match bounded(limit, self.store.list_scans_for_product(product.id)).await {
            Ok(history) => history,
            Err(err) => {
                if let Some(reservation) = reservation {
                    let _ = reservation.refund(self.store.as_ref()).await;
                }
                return Err(err.into());
            }
        };
        let latest = aggregation::latest_per_platform(&history);

        let from_llm = if reservation.is_some() {
            self.ask_for_recommendations(product, &latest).await
        } else {
            None
        };
        let recommendation =
            from_llm.unwrap_or_else(|| fallback_recommendation(product, &latest));

        let new = NewOptimization {
            product_id: product.id,
            shop_id: product.shop_id,
            suggestions: recommendation.suggestions,
            quick_wins: recommendation.quick_wins,
            current_score: product.citation_rate,
            potential_score: recommendation.potential_score,
            source: recommendation.source,
        };
        // Not bounded: a dropped insert may still commit after the refund.
        let optimization = match self.store.insert_optimization(&new).await {
            Ok(optimization) => optimization,
            Err(err) => {
                if let Some(reservation) = reservation {
                    let _ = reservation.refund(self.store.as_ref()).await;
                }
                return Err(err.into());
            }
        };

        let charged = match reservation {
            Some(reservation) if optimization.source == RecommendationSource::Llm => {
                let amount = reservation.amount();
                let _ = reservation.commit();
                amount
            }
            Some(reservation) => {
                let _ = reservation.refund(self.store.as_ref()).await;
                0
            }
            None => 0,
        };

        tracing::info!(
            product_id = product.id,
            optimization_id = optimization.id,
            source = %optimization.source,
            charged,
            "recommendations generated"
        );
        self.record_event(
            product,
            EventKind::RecommendationsGenerated,
            json!({
                "optimization_id": optimization.id,
                "source": optimization.source,
                "credits_charged": charged,
            }),
        )
        .await;

        Ok(optimization)
    }

    async fn ask_for_recommendations(
        &self,
        product: &Product,
        latest: &[&Scan],
    ) -> Option<Recommendation> {
        let preferred = self.settings.recommendation_platform;
        let Some((platform, provider)) = std::iter::once(preferred)
            .chain(Platform::ALL.into_iter().filter(|p| *p != preferred))
            .find_map(|p| self.providers.get(p).map(|provider| (p, provider)))
        else {
            tracing::info!(product_id = product.id, "no assistant configured for recommendations");
            return None;
        };

        let prompt = build_prompt(product, latest);
        let reply = match tokio::time::timeout(
            self.settings.llm_timeout,
            provider.send(RECOMMENDATION_SYSTEM_PROMPT, &prompt),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                tracing::warn!(product_id = product.id, platform = %platform, error = %err, "recommendation request failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(product_id = product.id, platform = %platform, "recommendation request timed out");
                return None;
            }
        };

        let parsed = parse_recommendation(&reply.text, product.citation_rate);
        if parsed.is_none() {
            tracing::warn!(product_id = product.id, platform = %platform, "recommendation reply was not usable JSON");
        }
        parsed
    }

    /// Mark a recommendation bundle applied and stamp the product.
    ///
    /// # Errors
    ///
    /// - [`ScanError::OptimizationNotFound`]
    /// - [`ScanError::OptimizationAlreadyApplied`] on every call after the
    ///   first, including a concurrent loser
    /// - [`ScanError::PersistenceFailure`]
    pub async fn apply_optimization(&self, optimization_id: i64) -> Result<Optimization, ScanError> {
        let limit = self.settings.store_timeout;
        let existing = bounded(limit, self.store.get_optimization(optimization_id))
            .await?
            .ok_or(ScanError::OptimizationNotFound(optimization_id))?;
        if existing.applied {
            return Err(ScanError::OptimizationAlreadyApplied(optimization_id));
        }

        let now = Utc::now();
        let applied = bounded(limit, self.store.mark_optimization_applied(optimization_id, now))
            .await?
            .ok_or(ScanError::OptimizationAlreadyApplied(optimization_id))?;
        bounded(limit, self.store.mark_product_optimized(applied.product_id, now)).await?;

        tracing::info!(
            optimization_id,
            product_id = applied.product_id,
            "optimization applied"
        );
        let event = alerts::event(
            applied.shop_id,
            Some(applied.product_id),
            EventKind::OptimizationApplied,
            json!({ "optimization_id": optimization_id }),
        );
        alerts::emit_event(self.store.as_ref(), event, limit).await;

        Ok(applied)
    }

    /// # Errors
    ///
    /// Returns [`ScanError::ProductNotFound`] or
    /// [`ScanError::PersistenceFailure`].
    pub async fn product_stats(&self, product_id: i64) -> Result<ProductStats, ScanError> {
        let product = self.load_product(product_id).await?;
        let scans = bounded(
            self.settings.store_timeout,
            self.store.list_scans_for_product(product.id),
        )
        .await?;
        Ok(aggregation::product_stats(&product, &scans))
    }

    /// # Errors
    ///
    /// Returns [`ScanError::ShopNotFound`] or
    /// [`ScanError::PersistenceFailure`].
    pub async fn shop_analytics(
        &self,
        shop_id: i64,
        window: AnalyticsWindow,
    ) -> Result<ShopAnalytics, ScanError> {
        let limit = self.settings.store_timeout;
        let shop = self.load_shop(shop_id).await?;
        let since = window.since(Utc::now());
        let products = bounded(limit, self.store.list_products_for_shop(shop.id)).await?;
        let scans = bounded(limit, self.store.list_scans_for_shop(shop.id, since)).await?;
        Ok(aggregation::shop_analytics(
            shop.id, window, since, &products, &scans,
        ))
    }
}
