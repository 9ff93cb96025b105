use std::path::PathBuf;

use crate::geo::LatLng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub api_base_url: String,
    /// Google Maps key; geocoding is disabled when absent.
    pub geocoding_api_key: Option<String>,
    pub geocoding_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub search_debounce_ms: u64,
    pub geocoder_max_retries: u32,
    pub geocoder_backoff_base_ms: u64,
    pub location_cache_ttl_secs: u64,
    pub default_center: LatLng,
    pub default_zoom: u8,
    pub session_path: PathBuf,
}

impl AppConfig {
    #[must_use]
    pub fn geocoding_enabled(&self) -> bool {
        self.geocoding_api_key.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field(
                "geocoding_api_key",
                &self.geocoding_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geocoding_url", &self.geocoding_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("geocoder_max_retries", &self.geocoder_max_retries)
            .field("geocoder_backoff_base_ms", &self.geocoder_backoff_base_ms)
            .field("location_cache_ttl_secs", &self.location_cache_ttl_secs)
            .field("default_center", &self.default_center)
            .field("default_zoom", &self.default_zoom)
            .field("session_path", &self.session_path)
            .finish()
    }
}
