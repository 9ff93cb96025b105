use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("CLINICMAP_API_BASE_URL", "https://api.clinics.example");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "CLINICMAP_ENV"));
}

#[test]
fn build_app_config_fails_without_api_base_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CLINICMAP_API_BASE_URL"),
        "expected MissingEnvVar(CLINICMAP_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_api_base_url_as_missing() {
    let mut map = full_env();
    map.insert("CLINICMAP_API_BASE_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_rejects_non_http_base_url() {
    let mut map = full_env();
    map.insert("CLINICMAP_API_BASE_URL", "ftp://clinics.example");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CLINICMAP_API_BASE_URL"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.api_base_url, "https://api.clinics.example");
    assert!(cfg.geocoding_api_key.is_none());
    assert!(!cfg.geocoding_enabled());
    assert_eq!(
        cfg.geocoding_url,
        "https://maps.googleapis.com/maps/api/geocode/json"
    );
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "clinicmap/0.1 (clinic-finder)");
    assert_eq!(cfg.search_debounce_ms, 800);
    assert_eq!(cfg.geocoder_max_retries, 2);
    assert_eq!(cfg.geocoder_backoff_base_ms, 500);
    assert_eq!(cfg.location_cache_ttl_secs, 300);
    assert_eq!(cfg.default_center, LatLng::new(-33.8688, 151.2093));
    assert_eq!(cfg.default_zoom, 12);
    assert_eq!(
        cfg.session_path,
        std::path::PathBuf::from(".clinicmap/session.json")
    );
}

#[test]
fn geocoding_key_enables_geocoding() {
    let mut map = full_env();
    map.insert("GOOGLE_MAPS_API_KEY", "maps-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.geocoding_enabled());
}

#[test]
fn blank_geocoding_key_is_ignored() {
    let mut map = full_env();
    map.insert("GOOGLE_MAPS_API_KEY", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.geocoding_enabled());
}

#[test]
fn debug_output_redacts_geocoding_key() {
    let mut map = full_env();
    map.insert("GOOGLE_MAPS_API_KEY", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn search_debounce_override() {
    let mut map = full_env();
    map.insert("CLINICMAP_SEARCH_DEBOUNCE_MS", "250");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.search_debounce_ms, 250);
}

#[test]
fn search_debounce_invalid() {
    let mut map = full_env();
    map.insert("CLINICMAP_SEARCH_DEBOUNCE_MS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CLINICMAP_SEARCH_DEBOUNCE_MS"),
        "got: {result:?}"
    );
}

#[test]
fn geocoder_max_retries_invalid() {
    let mut map = full_env();
    map.insert("CLINICMAP_GEOCODER_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CLINICMAP_GEOCODER_MAX_RETRIES"),
        "got: {result:?}"
    );
}

#[test]
fn default_center_override() {
    let mut map = full_env();
    map.insert("CLINICMAP_DEFAULT_CENTER", "-37.8136,144.9631");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.default_center, LatLng::new(-37.8136, 144.9631));
}

#[test]
fn default_center_invalid() {
    let mut map = full_env();
    map.insert("CLINICMAP_DEFAULT_CENTER", "somewhere");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CLINICMAP_DEFAULT_CENTER"),
        "got: {result:?}"
    );
}

#[test]
fn default_zoom_out_of_range() {
    let mut map = full_env();
    map.insert("CLINICMAP_DEFAULT_ZOOM", "30");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CLINICMAP_DEFAULT_ZOOM"),
        "got: {result:?}"
    );
}

#[test]
fn location_cache_ttl_override() {
    let mut map = full_env();
    map.insert("CLINICMAP_LOCATION_CACHE_TTL_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.location_cache_ttl_secs, 60);
}
