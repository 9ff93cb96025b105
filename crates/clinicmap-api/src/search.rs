//! HTTP client for the clinic search endpoint.
//!
//! `GET {base}/clinics/search?keywords=…` answers with a JSON array of
//! clinics, `null` when nothing matched, or (on a misbehaving backend) some
//! other JSON value, which is reported as [`ApiError::UnexpectedShape`].

use std::future::Future;
use std::time::Duration;

use clinicmap_core::{AppConfig, Clinic};
use reqwest::{Client, StatusCode, Url};

use crate::error::{json_kind, ApiError};

/// Anything that can run a clinic keyword search.
///
/// `Ok(None)` and `Ok(Some(vec![]))` both mean "no matches".
pub trait ClinicSearch: Send + Sync {
    fn search_clinics(
        &self,
        keywords: &str,
    ) -> impl Future<Output = Result<Option<Vec<Clinic>>, ApiError>> + Send;
}

/// Client for the clinic backend.
///
/// Use [`ClinicApiClient::new`] with the configured base URL; tests point it
/// at a wiremock server.
pub struct ClinicApiClient {
    client: Client,
    base_url: Url,
}

impl ClinicApiClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ApiError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// See [`ClinicApiClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    fn search_url(&self, keywords: &str) -> Result<Url, ApiError> {
        let mut url =
            self.base_url
                .join("clinics/search")
                .map_err(|e| ApiError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;
        url.query_pairs_mut().append_pair("keywords", keywords);
        Ok(url)
    }

    /// Runs one keyword search.
    ///
    /// Individual array entries that fail to parse are skipped with a
    /// warning rather than failing the whole response.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Unreachable`] if the server cannot be reached.
    /// - [`ApiError::RateLimited`] on HTTP 429.
    /// - [`ApiError::NotFound`] on HTTP 404.
    /// - [`ApiError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ApiError::Deserialize`] if the body is not JSON.
    /// - [`ApiError::UnexpectedShape`] if the body is neither an array nor `null`.
    pub async fn search(&self, keywords: &str) -> Result<Option<Vec<Clinic>>, ApiError> {
        let url = self.search_url(keywords)?;
        tracing::debug!(%url, "searching clinics");

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::from_send(url.as_str(), e))?;

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
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
                context: format!("clinic search (keywords={keywords})"),
                source: e,
            })?;

        parse_search_payload(keywords, value)
    }
}

impl ClinicSearch for ClinicApiClient {
    async fn search_clinics(&self, keywords: &str) -> Result<Option<Vec<Clinic>>, ApiError> {
        self.search(keywords).await
    }
}

fn parse_search_payload(
    keywords: &str,
    value: serde_json::Value,
) -> Result<Option<Vec<Clinic>>, ApiError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Array(items) => {
            let total = items.len();
            let clinics: Vec<Clinic> = items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<Clinic>(item) {
                    Ok(clinic) => Some(clinic),
                    Err(e) => {
                        tracing::warn!(keywords, error = %e, "skipping malformed clinic record");
                        None
                    }
                })
                .collect();
            tracing::debug!(
                keywords,
                total,
                parsed = clinics.len(),
                "clinic search response"
            );
            Ok(Some(clinics))
        }
        other => Err(ApiError::UnexpectedShape {
            context: format!("clinic search (keywords={keywords})"),
            expected: "array",
            found: json_kind(&other),
        }),
    }
}
