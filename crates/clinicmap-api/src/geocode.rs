//! Address geocoding against the Google Geocoding JSON API.

use std::future::Future;
use std::time::Duration;

use clinicmap_core::{AddressQuery, AppConfig, LatLng};
use reqwest::{Client, StatusCode, Url};

use crate::error::ApiError;
use crate::retry::retry_with_backoff;
use crate::types::GeocodeResponse;

/// Anything that can turn a postal address into coordinates.
///
/// `Ok(None)` means the address could not be resolved; callers treat it as
/// a soft, per-address failure.
pub trait Geocoder: Send + Sync {
    fn geocode_address(
        &self,
        query: &AddressQuery,
    ) -> impl Future<Output = Result<Option<LatLng>, ApiError>> + Send;
}

/// Google Geocoding API client with retry on transient failures.
pub struct GoogleGeocoder {
    client: Client,
    api_key: String,
    endpoint: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GoogleGeocoder {
    /// Creates a geocoder against `endpoint` (normally
    /// `https://maps.googleapis.com/maps/api/geocode/json`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ApiError::InvalidBaseUrl`] if `endpoint` does not parse.
    pub fn new(
        api_key: &str,
        endpoint: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let endpoint = Url::parse(endpoint).map_err(|e| ApiError::InvalidBaseUrl {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
            max_retries: 2,
            backoff_base_ms: 500,
        })
    }

    /// Overrides the retry policy (`0` disables retries).
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Builds a geocoder from configuration, or `None` when no API key is
    /// configured (geocoding then degrades to a pass-through).
    ///
    /// # Errors
    ///
    /// See [`GoogleGeocoder::new`].
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, ApiError> {
        let Some(api_key) = config.geocoding_api_key.as_deref() else {
            tracing::info!("GOOGLE_MAPS_API_KEY not set; geocoding disabled");
            return Ok(None);
        };
        let geocoder = Self::new(
            api_key,
            &config.geocoding_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retry_policy(config.geocoder_max_retries, config.geocoder_backoff_base_ms);
        Ok(Some(geocoder))
    }

    fn request_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("address", address)
            .append_pair("key", &self.api_key);
        url
    }

    /// Resolves `query` to coordinates.
    ///
    /// Blank addresses resolve to `None` without a network call.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RateLimited`] on HTTP 429 or `OVER_QUERY_LIMIT` after retries.
    /// - [`ApiError::Provider`] for `REQUEST_DENIED`, `INVALID_REQUEST` and the like.
    /// - [`ApiError::UnexpectedStatus`] / [`ApiError::NotFound`] for non-2xx statuses.
    /// - [`ApiError::Http`] / [`ApiError::Unreachable`] for transport failures.
    /// - [`ApiError::Deserialize`] if the body does not match the envelope.
    pub async fn geocode(&self, query: &AddressQuery) -> Result<Option<LatLng>, ApiError> {
        let address = query.formatted();
        if address.is_empty() {
            return Ok(None);
        }
        let url = self.request_url(&address);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let address = address.clone();
            async move { self.geocode_once(url, &address).await }
        })
        .await
    }

    async fn geocode_once(&self, url: Url, address: &str) -> Result<Option<LatLng>, ApiError> {
        // Errors name the endpoint, never the full URL: it carries the API key.
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::from_send(self.endpoint.as_str(), e.without_url()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ApiError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                url: self.endpoint.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Http(e.without_url()))?;
        let parsed: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
                context: format!("geocode(address={address})"),
                source: e,
            })?;

        interpret_response(address, parsed)
    }
}

impl Geocoder for GoogleGeocoder {
    async fn geocode_address(&self, query: &AddressQuery) -> Result<Option<LatLng>, ApiError> {
        self.geocode(query).await
    }
}

fn interpret_response(
    address: &str,
    response: GeocodeResponse,
) -> Result<Option<LatLng>, ApiError> {
    match response.status.as_str() {
        "OK" => {
            let location = response
                .results
                .first()
                .map(|r| LatLng::new(r.geometry.location.lat, r.geometry.location.lng))
                .filter(LatLng::is_valid);
            if location.is_none() {
                tracing::warn!(address, "geocoder returned OK without a usable location");
            }
            Ok(location)
        }
        "ZERO_RESULTS" => {
            tracing::debug!(address, "geocoder found no match");
            Ok(None)
        }
        "OVER_QUERY_LIMIT" => Err(ApiError::RateLimited {
            retry_after_secs: None,
        }),
        _ => Err(ApiError::Provider {
            status: response.status,
            message: response.error_message,
        }),
    }
}
