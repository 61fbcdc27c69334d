//! Scan orchestration, credit accounting and analytics for `RankInAI`.
//!
//! The [`ScanEngine`] drives a product scan end to end: it reserves credits,
//! asks the configured assistant a shopping question, analyzes the reply,
//! stores the scan and refreshes the product's cached citation rates. It
//! also produces recommendation bundles and the read-side rollups. All
//! persistence goes through the [`Store`] trait.

pub mod aggregation;
pub mod alerts;
pub mod credits;
pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod recommendations;
pub mod store;

pub use aggregation::{ProductStats, ShopAnalytics};
pub use credits::CreditReservation;
pub use error::{ScanError, StoreError};
pub use orchestrator::{
    CompleteScanOutcome, EngineSettings, PlatformScan, Providers, ScanEngine, ScanOutcome,
};
pub use recommendations::Recommendation;
pub use store::{MemoryStore, PgStore, Store};
