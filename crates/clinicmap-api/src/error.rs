use thiserror::Error;

/// Errors returned by the clinic search and geocoding clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server could not be reached at all (DNS, refused connection).
    #[error("could not reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body was valid JSON but not the shape the endpoint promises.
    #[error("unexpected response shape for {context}: expected {expected}, got {found}")]
    UnexpectedShape {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The geocoding provider answered with a non-success status such as
    /// `REQUEST_DENIED` or `INVALID_REQUEST`.
    #[error("geocoding provider returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Provider {
        status: String,
        message: Option<String>,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// HTTP status associated with this error, when there is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimited { .. } => Some(429),
            ApiError::NotFound { .. } => Some(404),
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| reqwest::StatusCode::as_u16(&s)),
            _ => None,
        }
    }

    /// `true` when the failure means the client is offline or the server is
    /// unreachable, as opposed to the server answering with an error.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            ApiError::Unreachable { .. } => true,
            ApiError::Http(e) => e.is_connect(),
            _ => false,
        }
    }

    /// Maps a `reqwest` send failure, singling out connection failures.
    pub(crate) fn from_send(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            ApiError::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            ApiError::Http(err)
        }
    }
}

/// Short JSON type name for shape errors.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_reported_for_http_buckets() {
        assert_eq!(
            ApiError::RateLimited {
                retry_after_secs: None
            }
            .status(),
            Some(429)
        );
        assert_eq!(
            ApiError::NotFound {
                url: "https://x.example".to_owned()
            }
            .status(),
            Some(404)
        );
        assert_eq!(
            ApiError::UnexpectedStatus {
                status: 503,
                url: "https://x.example".to_owned()
            }
            .status(),
            Some(503)
        );
    }

    #[test]
    fn unreachable_is_connectivity() {
        let err = ApiError::Unreachable {
            url: "https://x.example".to_owned(),
            reason: "connection refused".to_owned(),
        };
        assert!(err.is_connectivity());
        assert!(err.status().is_none());
    }

    #[test]
    fn provider_error_message_falls_back() {
        let err = ApiError::Provider {
            status: "REQUEST_DENIED".to_owned(),
            message: None,
        };
        assert_eq!(
            err.to_string(),
            "geocoding provider returned REQUEST_DENIED: no message"
        );
    }

    #[test]
    fn json_kind_names() {
        assert_eq!(json_kind(&serde_json::json!(null)), "null");
        assert_eq!(json_kind(&serde_json::json!({"a": 1})), "object");
        assert_eq!(json_kind(&serde_json::json!([1])), "array");
    }
}
