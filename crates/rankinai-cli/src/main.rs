mod commands;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rankinai_core::{AnalyticsWindow, Platform};
use rankinai_scanner::{PgStore, ScanEngine};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rankinai-cli")]
#[command(about = "RankInAI operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Scan one product against one assistant (costs one credit)
    Scan {
        /// Product id
        #[arg(long)]
        product: i64,
        /// CHATGPT or GEMINI
        #[arg(long, value_parser = parse_platform)]
        platform: Platform,
    },
    /// Scan one product against every assistant, then generate recommendations
    ScanComplete {
        #[arg(long)]
        product: i64,
    },
    /// Generate recommendations for a product (costs one credit)
    Recommend {
        #[arg(long)]
        product: i64,
    },
    /// Mark a stored optimization as applied
    Apply {
        /// Optimization id
        #[arg(long)]
        optimization: i64,
    },
    /// Show cached rates and scan breakdown for a product
    Stats {
        #[arg(long)]
        product: i64,
    },
    /// Show shop-wide analytics over a window
    Analytics {
        /// Shop id
        #[arg(long)]
        shop: i64,
        /// 7d, 30d or all
        #[arg(long, default_value = "30d", value_parser = parse_window)]
        window: AnalyticsWindow,
    },
    /// Refill credits for every shop whose billing cycle has ended
    Recharge,
    /// Soft-reset a shop to the trial plan (as on uninstall)
    ResetShop {
        /// Shop domain, e.g. acme.myshopify.com
        #[arg(long)]
        domain: String,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

fn parse_platform(raw: &str) -> Result<Platform, String> {
    raw.parse().map_err(|e: rankinai_core::CoreError| e.to_string())
}

fn parse_window(raw: &str) -> Result<AnalyticsWindow, String> {
    raw.parse().map_err(|e: rankinai_core::CoreError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("rankinai-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = rankinai_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = rankinai_db::PoolConfig::from_app_config(&config);
    let pool = rankinai_db::connect_pool(&config.database_url, pool_config).await?;

    if let Commands::Db { command } = &command {
        return match command {
            DbCommands::Ping => commands::run_db_ping(&pool).await,
            DbCommands::Migrate => commands::run_db_migrate(&pool).await,
        };
    }

    let pricing = rankinai_core::load_pricing(config.plans_path.as_deref())?;
    let engine = ScanEngine::from_app_config(Arc::new(PgStore::new(pool)), &config, pricing)?;

    match command {
        Commands::Db { .. } => Ok(()),
        Commands::Scan { product, platform } => {
            commands::run_scan(&engine, product, platform).await
        }
        Commands::ScanComplete { product } => commands::run_scan_complete(&engine, product).await,
        Commands::Recommend { product } => commands::run_recommend(&engine, product).await,
        Commands::Apply { optimization } => commands::run_apply(&engine, optimization).await,
        Commands::Stats { product } => commands::run_stats(&engine, product).await,
        Commands::Analytics { shop, window } => {
            commands::run_analytics(&engine, shop, window).await
        }
        Commands::Recharge => commands::run_recharge(&engine).await,
        Commands::ResetShop { domain } => commands::run_reset_shop(&engine, &domain).await,
    }
}
