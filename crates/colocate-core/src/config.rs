use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, FailSafe};
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
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional_path = |var: &str| -> Option<PathBuf> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let host_brand = require("COLOCATE_HOST_BRAND")?.trim().to_string();
    let env = parse_environment(&or_default("COLOCATE_ENV", "development"))?;
    let log_level = or_default("COLOCATE_LOG_LEVEL", "info");
    let lexicon_path = optional_path("COLOCATE_LEXICON_PATH");

    let workers = parse_usize("COLOCATE_WORKERS", "8")?;
    if workers == 0 {
        return Err(invalid("COLOCATE_WORKERS", "must be at least 1".to_string()));
    }
    let max_attempts = parse_u32("COLOCATE_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid(
            "COLOCATE_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let retry_backoff_base_ms = parse_u64("COLOCATE_RETRY_BACKOFF_BASE_MS", "1000")?;
    let source_timeout_secs = parse_u64("COLOCATE_SOURCE_TIMEOUT_SECS", "45")?;
    let checkpoint_every = parse_usize("COLOCATE_CHECKPOINT_EVERY", "5")?;
    let min_reviews = parse_u64("COLOCATE_MIN_REVIEWS", "10000")?;
    let skip_search_below_min_reviews =
        parse_bool("COLOCATE_SKIP_SEARCH_BELOW_MIN_REVIEWS", "false")?;

    let search_radius_meters = or_default("COLOCATE_SEARCH_RADIUS_METERS", "200")
        .parse::<f64>()
        .map_err(|e| invalid("COLOCATE_SEARCH_RADIUS_METERS", e.to_string()))?;
    if !search_radius_meters.is_finite() || search_radius_meters < 0.0 {
        return Err(invalid(
            "COLOCATE_SEARCH_RADIUS_METERS",
            "must be a non-negative number".to_string(),
        ));
    }

    let (fail_safe, fail_safe_configured) = match lookup("COLOCATE_FAIL_SAFE") {
        Ok(raw) => (parse_fail_safe(&raw)?, true),
        Err(_) => (FailSafe::default(), false),
    };

    let output_dir = PathBuf::from(or_default("COLOCATE_OUTPUT_DIR", "./json_data"));
    let anchors_path = optional_path("COLOCATE_ANCHORS_PATH");
    let fixture_path = optional_path("COLOCATE_FIXTURE_PATH");

    Ok(AppConfig {
        env,
        log_level,
        host_brand,
        lexicon_path,
        workers,
        max_attempts,
        retry_backoff_base_ms,
        source_timeout_secs,
        checkpoint_every,
        min_reviews,
        skip_search_below_min_reviews,
        search_radius_meters,
        fail_safe,
        fail_safe_configured,
        output_dir,
        anchors_path,
        fixture_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COLOCATE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_fail_safe(s: &str) -> Result<FailSafe, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "assume-no-match" | "no-match" => Ok(FailSafe::AssumeNoMatch),
        "assume-match" | "match" => Ok(FailSafe::AssumeMatch),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COLOCATE_FAIL_SAFE".to_string(),
            reason: format!("expected 'assume-match' or 'assume-no-match', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
