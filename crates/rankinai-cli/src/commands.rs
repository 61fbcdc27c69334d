//! Command handlers for the CLI.
//!
//! Each handler prints its result as pretty JSON on stdout; logs go to
//! stderr so the output can be piped.

use chrono::Utc;
use rankinai_core::{AnalyticsWindow, Platform};
use rankinai_scanner::{lifecycle, ScanEngine};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn run_db_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    rankinai_db::ping(pool).await?;
    println!("database reachable");
    Ok(())
}

pub(crate) async fn run_db_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = rankinai_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

pub(crate) async fn run_scan(
    engine: &ScanEngine,
    product_id: i64,
    platform: Platform,
) -> anyhow::Result<()> {
    let outcome = engine.run_scan(product_id, platform).await?;
    tracing::info!(
        product_id,
        platform = %platform,
        cited = outcome.scan.is_cited,
        credits_remaining = outcome.credits_remaining,
        "scan finished"
    );
    print_json(&outcome)
}

/// Partial failures are reported inside the JSON rather than as an error
/// exit, matching the HTTP endpoint.
pub(crate) async fn run_scan_complete(engine: &ScanEngine, product_id: i64) -> anyhow::Result<()> {
    let outcome = engine.run_complete_scan(product_id).await?;
    print_json(&outcome)
}

pub(crate) async fn run_recommend(engine: &ScanEngine, product_id: i64) -> anyhow::Result<()> {
    let optimization = engine.generate_recommendations(product_id).await?;
    print_json(&optimization)
}

pub(crate) async fn run_apply(engine: &ScanEngine, optimization_id: i64) -> anyhow::Result<()> {
    let optimization = engine.apply_optimization(optimization_id).await?;
    print_json(&optimization)
}

pub(crate) async fn run_stats(engine: &ScanEngine, product_id: i64) -> anyhow::Result<()> {
    let stats = engine.product_stats(product_id).await?;
    print_json(&stats)
}

pub(crate) async fn run_analytics(
    engine: &ScanEngine,
    shop_id: i64,
    window: AnalyticsWindow,
) -> anyhow::Result<()> {
    let analytics = engine.shop_analytics(shop_id, window).await?;
    print_json(&analytics)
}

pub(crate) async fn run_recharge(engine: &ScanEngine) -> anyhow::Result<()> {
    let recharged = lifecycle::recharge_due_shops(engine.store().as_ref(), Utc::now()).await?;
    println!("recharged {} shop(s)", recharged.len());
    for shop in &recharged {
        println!(
            "  {} -> {} credits, next cycle ends {}",
            shop.domain,
            shop.credits,
            shop.cycle_ends_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub(crate) async fn run_reset_shop(engine: &ScanEngine, domain: &str) -> anyhow::Result<()> {
    match lifecycle::reset_shop_to_trial(engine.store().as_ref(), engine.pricing(), domain).await? {
        Some(shop) => print_json(&shop),
        None => anyhow::bail!("no shop with domain '{domain}'"),
    }
}
