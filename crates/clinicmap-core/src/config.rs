use crate::app_config::{AppConfig, Environment};
use crate::geo::LatLng;
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
/// Kept separate from the process environment so it can be tested with a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        or_default(var, default)
            .parse::<u8>()
            .map_err(|e| invalid(var, e.to_string()))
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

    let api_base_url = require("CLINICMAP_API_BASE_URL")?;
    if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
        return Err(invalid(
            "CLINICMAP_API_BASE_URL",
            format!("expected an http(s) URL, got \"{api_base_url}\""),
        ));
    }

    let env = parse_environment(&or_default("CLINICMAP_ENV", "development"))?;
    let log_level = or_default("CLINICMAP_LOG_LEVEL", "info");

    let geocoding_api_key = lookup("GOOGLE_MAPS_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let geocoding_url = or_default(
        "CLINICMAP_GEOCODING_URL",
        "https://maps.googleapis.com/maps/api/geocode/json",
    );

    let request_timeout_secs = parse_u64("CLINICMAP_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CLINICMAP_USER_AGENT", "clinicmap/0.1 (clinic-finder)");
    let search_debounce_ms = parse_u64("CLINICMAP_SEARCH_DEBOUNCE_MS", "800")?;
    let geocoder_max_retries = parse_u32("CLINICMAP_GEOCODER_MAX_RETRIES", "2")?;
    let geocoder_backoff_base_ms = parse_u64("CLINICMAP_GEOCODER_BACKOFF_BASE_MS", "500")?;
    let location_cache_ttl_secs = parse_u64("CLINICMAP_LOCATION_CACHE_TTL_SECS", "300")?;

    let raw_center = or_default("CLINICMAP_DEFAULT_CENTER", "-33.8688,151.2093");
    let default_center = LatLng::parse(&raw_center)
        .map_err(|e| invalid("CLINICMAP_DEFAULT_CENTER", e.to_string()))?;

    let default_zoom = parse_u8("CLINICMAP_DEFAULT_ZOOM", "12")?;
    if default_zoom > 22 {
        return Err(invalid(
            "CLINICMAP_DEFAULT_ZOOM",
            format!("zoom must be 0..=22, got {default_zoom}"),
        ));
    }

    let session_path = PathBuf::from(or_default(
        "CLINICMAP_SESSION_PATH",
        ".clinicmap/session.json",
    ));

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        geocoding_api_key,
        geocoding_url,
        request_timeout_secs,
        user_agent,
        search_debounce_ms,
        geocoder_max_retries,
        geocoder_backoff_base_ms,
        location_cache_ttl_secs,
        default_center,
        default_zoom,
        session_path,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CLINICMAP_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
