//! Merchant alerts and audit events.
//!
//! Emission never fails the operation that triggered it: store errors are
//! logged at warn level and dropped.

use std::time::Duration;

use rankinai_core::{AlertKind, EventKind, NewAlert, NewEvent, Product, Scan};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::aggregation::citation_rate;
use crate::store::{bounded, Store};

/// Number of most recent scans compared against the earlier history.
pub const CITATION_DROP_WINDOW: usize = 5;

/// True only on the debit that takes the balance from above `threshold`
/// to at or below it.
#[must_use]
pub fn crosses_low_credit_threshold(before: i32, after: i32, threshold: i32) -> bool {
    before > threshold && after <= threshold
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CitationDrop {
    pub recent_rate: f64,
    pub baseline_rate: f64,
    /// Percentage points lost.
    pub drop: f64,
}

/// Compare the last [`CITATION_DROP_WINDOW`] scans with everything before
/// them. Needs at least that many earlier scans; returns `Some` when the
/// recent rate is `threshold` points or more below the baseline.
#[must_use]
pub fn detect_citation_drop(scans: &[Scan], threshold: f64) -> Option<CitationDrop> {
    drop_in(&chronological(scans), threshold)
}

/// Like [`detect_citation_drop`], but only for the scan that opens a drop.
/// `None` when the history without its newest scan already showed one, so a
/// lasting drop is reported once.
#[must_use]
pub fn detect_new_citation_drop(scans: &[Scan], threshold: f64) -> Option<CitationDrop> {
    let drop = detect_citation_drop(scans, threshold)?;
    let ordered = chronological(scans);
    let before_newest = &ordered[..ordered.len() - 1];
    drop_in(before_newest, threshold).is_none().then_some(drop)
}

fn chronological(scans: &[Scan]) -> Vec<&Scan> {
    let mut ordered: Vec<&Scan> = scans.iter().collect();
    ordered.sort_by_key(|s| (s.created_at, s.id));
    ordered
}

/// `ordered` must be oldest first.
fn drop_in(ordered: &[&Scan], threshold: f64) -> Option<CitationDrop> {
    if ordered.len() < CITATION_DROP_WINDOW * 2 {
        return None;
    }
    let (earlier, recent) = ordered.split_at(ordered.len() - CITATION_DROP_WINDOW);

    let rate = |group: &[&Scan]| citation_rate(group.iter().filter(|s| s.is_cited).count(), group.len());
    let baseline_rate = rate(earlier);
    let recent_rate = rate(recent);
    let drop = baseline_rate - recent_rate;

    (drop >= threshold).then_some(CitationDrop {
        recent_rate,
        baseline_rate,
        drop,
    })
}

#[must_use]
pub fn low_credit_alert(shop_id: i64, balance: i32, threshold: i32) -> NewAlert {
    NewAlert {
        shop_id,
        product_id: None,
        kind: AlertKind::LowCredits,
        message: format!("Only {balance} scan credits left this cycle"),
        metadata: json!({ "balance": balance, "threshold": threshold }),
    }
}

#[must_use]
pub fn citation_drop_alert(product: &Product, drop: &CitationDrop) -> NewAlert {
    NewAlert {
        shop_id: product.shop_id,
        product_id: Some(product.id),
        kind: AlertKind::CitationDrop,
        message: format!(
            "Citation rate for \"{}\" fell {:.1} points over the last {CITATION_DROP_WINDOW} scans",
            product.title, drop.drop
        ),
        metadata: json!({
            "recent_rate": drop.recent_rate,
            "baseline_rate": drop.baseline_rate,
            "drop": drop.drop,
        }),
    }
}

#[must_use]
pub fn event(shop_id: i64, product_id: Option<i64>, kind: EventKind, payload: Value) -> NewEvent {
    NewEvent {
        shop_id,
        product_id,
        kind,
        payload,
    }
}

pub(crate) async fn emit_alert(store: &dyn Store, alert: NewAlert, limit: Duration) {
    if let Err(err) = bounded(limit, store.insert_alert(&alert)).await {
        warn!(
            shop_id = alert.shop_id,
            kind = %alert.kind,
            error = %err,
            "failed to record alert"
        );
    }
}

pub(crate) async fn emit_event(store: &dyn Store, event: NewEvent, limit: Duration) {
    if let Err(err) = bounded(limit, store.insert_event(&event)).await {
        warn!(
            shop_id = event.shop_id,
            kind = %event.kind,
            error = %err,
            "failed to record event"
        );
    }
}
