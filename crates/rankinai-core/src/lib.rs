//! Domain types, pricing and configuration shared across the `RankInAI` workspace.

mod alerts;
mod app_config;
mod config;
mod error;
mod optimizations;
mod plans;
mod products;
mod scans;
mod shops;
mod window;

pub use alerts::{AlertKind, EventKind, NewAlert, NewEvent};
pub use app_config::{AppConfig, CompetitorMode, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use optimizations::{
    DescriptionSuggestion, NewOptimization, Optimization, RecommendationSource, SeoSuggestion,
    Suggestions, TagSuggestion, TitleSuggestion,
};
pub use plans::{load_pricing, Plan, PlanAllotment, PricingTable};
pub use products::{NewProduct, Product, ProductStatsUpdate};
pub use scans::{NewScan, Platform, Scan, Sentiment};
pub use shops::{BillingInterval, Shop};
pub use window::AnalyticsWindow;
