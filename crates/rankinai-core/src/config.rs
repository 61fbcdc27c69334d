use crate::app_config::{AppConfig, CompetitorMode, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("RANKINAI_ENV", "development"));
    let bind_addr: SocketAddr = parse_as(
        "RANKINAI_BIND_ADDR",
        &or_default("RANKINAI_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("RANKINAI_LOG_LEVEL", "info");
    let plans_path = optional("RANKINAI_PLANS_PATH").map(PathBuf::from);

    let db_max_connections: u32 = parse_as(
        "RANKINAI_DB_MAX_CONNECTIONS",
        &or_default("RANKINAI_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "RANKINAI_DB_MIN_CONNECTIONS",
        &or_default("RANKINAI_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "RANKINAI_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("RANKINAI_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_model = or_default("RANKINAI_OPENAI_MODEL", "gpt-4o-mini");
    let openai_base_url = or_default("RANKINAI_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("RANKINAI_GEMINI_MODEL", "gemini-1.5-flash");
    let gemini_base_url = or_default(
        "RANKINAI_GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com/v1beta",
    );

    let llm_timeout_secs: u64 = parse_as(
        "RANKINAI_LLM_TIMEOUT_SECS",
        &or_default("RANKINAI_LLM_TIMEOUT_SECS", "30"),
    )?;
    let llm_max_retries: u32 = parse_as(
        "RANKINAI_LLM_MAX_RETRIES",
        &or_default("RANKINAI_LLM_MAX_RETRIES", "2"),
    )?;
    let llm_retry_backoff_base_ms: u64 = parse_as(
        "RANKINAI_LLM_RETRY_BACKOFF_BASE_MS",
        &or_default("RANKINAI_LLM_RETRY_BACKOFF_BASE_MS", "500"),
    )?;
    let store_timeout_secs: u64 = parse_as(
        "RANKINAI_STORE_TIMEOUT_SECS",
        &or_default("RANKINAI_STORE_TIMEOUT_SECS", "10"),
    )?;

    let low_credit_threshold: i32 = parse_as(
        "RANKINAI_LOW_CREDIT_THRESHOLD",
        &or_default("RANKINAI_LOW_CREDIT_THRESHOLD", "10"),
    )?;
    let citation_drop_threshold: f64 = parse_as(
        "RANKINAI_CITATION_DROP_THRESHOLD",
        &or_default("RANKINAI_CITATION_DROP_THRESHOLD", "15.0"),
    )?;
    if !(0.0..=100.0).contains(&citation_drop_threshold) {
        return Err(ConfigError::InvalidEnvVar {
            var: "RANKINAI_CITATION_DROP_THRESHOLD".to_string(),
            reason: format!("{citation_drop_threshold} is outside 0..=100"),
        });
    }

    let competitor_mode = parse_competitor_mode(&or_default("RANKINAI_COMPETITOR_MODE", "enriched"))
        .ok_or_else(|| ConfigError::InvalidEnvVar {
            var: "RANKINAI_COMPETITOR_MODE".to_string(),
            reason: "expected `reference` or `enriched`".to_string(),
        })?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        plans_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        openai_api_key,
        openai_model,
        openai_base_url,
        gemini_api_key,
        gemini_model,
        gemini_base_url,
        llm_timeout_secs,
        llm_max_retries,
        llm_retry_backoff_base_ms,
        store_timeout_secs,
        low_credit_threshold,
        citation_drop_threshold,
        competitor_mode,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_competitor_mode(s: &str) -> Option<CompetitorMode> {
    match s.trim().to_ascii_lowercase().as_str() {
        "reference" => Some(CompetitorMode::Reference),
        "enriched" => Some(CompetitorMode::Enriched),
        _ => None,
    }
}
