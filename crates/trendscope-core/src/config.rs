use crate::app_config::{AppConfig, Environment};
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
/// Parsing is decoupled from the real environment so tests can drive it with
/// a plain `HashMap` lookup.
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

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("TRENDSCOPE_ENV", "development"));

    let bind_addr = parse_addr("TRENDSCOPE_BIND_ADDR", "0.0.0.0:5000")?;
    let log_level = or_default("TRENDSCOPE_LOG_LEVEL", "info");
    let snapshot_path = PathBuf::from(or_default(
        "TRENDSCOPE_SNAPSHOT_PATH",
        "./dashboard_data.json",
    ));

    let db_max_connections = parse_u32("TRENDSCOPE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TRENDSCOPE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TRENDSCOPE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let source_api_key = optional("TIKHUB_API_KEY");
    let source_base_url = or_default("TRENDSCOPE_SOURCE_BASE_URL", "https://api.tikhub.io");
    let source_request_timeout_secs = parse_u64("TRENDSCOPE_SOURCE_TIMEOUT_SECS", "30")?;
    let source_user_agent = or_default(
        "TRENDSCOPE_SOURCE_USER_AGENT",
        "trendscope/0.1 (trend-analytics)",
    );
    let source_max_retries = parse_u32("TRENDSCOPE_SOURCE_MAX_RETRIES", "3")?;
    let source_retry_backoff_base_secs =
        parse_u64("TRENDSCOPE_SOURCE_RETRY_BACKOFF_BASE_SECS", "2")?;

    let collect_timeout_secs = parse_u64("TRENDSCOPE_COLLECT_TIMEOUT_SECS", "300")?;
    let export_timeout_secs = parse_u64("TRENDSCOPE_EXPORT_TIMEOUT_SECS", "60")?;
    let refresh_cron = optional("TRENDSCOPE_REFRESH_CRON");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        snapshot_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        source_api_key,
        source_base_url,
        source_request_timeout_secs,
        source_user_agent,
        source_max_retries,
        source_retry_backoff_base_secs,
        collect_timeout_secs,
        export_timeout_secs,
        refresh_cron,
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

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
