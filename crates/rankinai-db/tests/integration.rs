//! Offline unit tests for rankinai-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use rankinai_core::{
    AppConfig, BillingInterval, CompetitorMode, Environment, Optimization, Plan,
    RecommendationSource, Scan, Sentiment, Shop, Suggestions,
};
use rankinai_db::{DbError, OptimizationRow, PoolConfig, ScanRow, ShopRow};
use sqlx::types::Json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        plans_path: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        openai_api_key: None,
        openai_model: "gpt-4o-mini".to_string(),
        openai_base_url: "https://api.openai.com/v1".to_string(),
        gemini_api_key: None,
        gemini_model: "gemini-1.5-flash".to_string(),
        gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        llm_timeout_secs: 30,
        llm_max_retries: 2,
        llm_retry_backoff_base_ms: 500,
        store_timeout_secs: 10,
        low_credit_threshold: 10,
        citation_drop_threshold: 15.0,
        competitor_mode: CompetitorMode::Enriched,
    }
}

fn shop_row(plan: &str) -> ShopRow {
    let now = Utc::now();
    ShopRow {
        id: 1,
        domain: "acme-yoga.myshopify.com".to_string(),
        plan: plan.to_string(),
        credits: 5,
        credit_cap: 100,
        billing_interval: "YEARLY".to_string(),
        cycle_started_at: now,
        cycle_ends_at: now,
        installed: true,
        created_at: now,
        updated_at: now,
    }
}

fn scan_row(is_cited: bool, sentiment: Option<&str>) -> ScanRow {
    ScanRow {
        id: 9,
        product_id: 2,
        shop_id: 1,
        platform: "GEMINI".to_string(),
        question: "What are the best yoga mats?".to_string(),
        response: "1. Acme UltraMat Pro".to_string(),
        is_cited,
        citation_excerpt: None,
        citation_position: Some(1),
        sentiment: sentiment.map(str::to_string),
        competitors: vec!["Manduka".to_string()],
        missing_topics: vec![],
        ignored_features: vec![],
        confidence: 0.8,
        credits_used: 1,
        duration_ms: 812,
        prompt_tokens: Some(40),
        completion_tokens: None,
        request_key: uuid::Uuid::nil(),
        created_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
    assert_eq!(pool_config.statement_timeout_secs, 10);
}

#[test]
fn shop_row_converts_enum_columns() {
    let shop = Shop::try_from(shop_row("GROWTH")).expect("valid row");
    assert_eq!(shop.plan, Plan::Growth);
    assert_eq!(shop.billing_interval, BillingInterval::Yearly);
    assert_eq!(shop.credits, 5);
}

#[test]
fn shop_row_with_unknown_plan_is_invalid_value() {
    let err = Shop::try_from(shop_row("ENTERPRISE")).unwrap_err();
    assert!(matches!(err, DbError::InvalidValue(_)), "got {err:?}");
}

#[test]
fn scan_row_converts_platform_and_sentiment() {
    let scan = Scan::try_from(scan_row(true, Some("POSITIVE"))).expect("valid row");
    assert_eq!(scan.platform, rankinai_core::Platform::Gemini);
    assert_eq!(scan.sentiment, Some(Sentiment::Positive));
    assert_eq!(scan.competitors, vec!["Manduka".to_string()]);

    let uncited = Scan::try_from(scan_row(false, None)).expect("valid row");
    assert_eq!(uncited.sentiment, None);
}

#[test]
fn scan_row_with_bad_sentiment_is_invalid_value() {
    let err = Scan::try_from(scan_row(true, Some("ECSTATIC"))).unwrap_err();
    assert!(matches!(err, DbError::InvalidValue(_)));
}

#[test]
fn optimization_row_unwraps_json_suggestions() {
    let mut suggestions = Suggestions::default();
    suggestions.title.suggested = "Acme UltraMat Pro Non-Slip Yoga Mat".to_string();
    let row = OptimizationRow {
        id: 3,
        product_id: 2,
        shop_id: 1,
        suggestions: Json(suggestions),
        quick_wins: vec!["Add grip details".to_string()],
        current_score: 40.0,
        potential_score: 65.0,
        source: "fallback".to_string(),
        applied: false,
        applied_at: None,
        created_at: Utc::now(),
    };
    let opt = Optimization::try_from(row).expect("valid row");
    assert_eq!(opt.source, RecommendationSource::Fallback);
    assert_eq!(
        opt.suggestions.title.suggested,
        "Acme UltraMat Pro Non-Slip Yoga Mat"
    );
}
