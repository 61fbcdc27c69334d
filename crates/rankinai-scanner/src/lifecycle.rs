//! Billing-cycle recharge and uninstall handling.

use chrono::{DateTime, Utc};
use rankinai_core::{Plan, PricingTable, Shop};

use crate::error::StoreError;
use crate::store::Store;

/// Refill every installed shop whose cycle has ended.
///
/// # Errors
///
/// Returns [`StoreError`] if the store update fails.
pub async fn recharge_due_shops(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<Vec<Shop>, StoreError> {
    let recharged = store.recharge_due_shops(now).await?;
    for shop in &recharged {
        tracing::info!(
            shop_id = shop.id,
            domain = %shop.domain,
            credits = shop.credits,
            cycle_ends_at = %shop.cycle_ends_at,
            "shop credits recharged"
        );
    }
    tracing::info!(count = recharged.len(), "recharge run complete");
    Ok(recharged)
}

/// Soft-reset the shop behind `domain` to the trial plan. `None` when the
/// domain is unknown.
///
/// # Errors
///
/// Returns [`StoreError`] if the store update fails.
pub async fn reset_shop_to_trial(
    store: &dyn Store,
    pricing: &PricingTable,
    domain: &str,
) -> Result<Option<Shop>, StoreError> {
    let trial_cap = pricing.credits_for(Plan::Trial);
    let shop = store.reset_shop_to_trial(domain, trial_cap).await?;
    match &shop {
        Some(shop) => tracing::info!(shop_id = shop.id, domain, "shop reset to trial"),
        None => tracing::warn!(domain, "uninstall for unknown shop domain"),
    }
    Ok(shop)
}
