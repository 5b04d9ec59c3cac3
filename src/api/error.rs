use serde::Deserialize;
use thiserror::Error;

/// Errors returned by every backend call.
///
/// Callers decide the policy: the featured image aggregator turns any of
/// these into the placeholder, the form submitters abort and report.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request and response did not complete within the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    /// 401/403, or a token the backend refused to validate
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    /// 404 from the backend (deleted or never existing resource)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Any other non-2xx response
    #[error("HTTP error {status}: {message}")]
    Http {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// Body was not the JSON we expected
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Response body exceeded the configured limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// The request could not be built (bad URL, bad MIME type)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Short, stable name of the failure class for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Http { .. } => "http",
            Self::Malformed(_) => "malformed",
            Self::ResponseTooLarge(_) => "too_large",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Map a non-success status and its body to an error.
    ///
    /// WordPress reports failures as `{"code": "...", "message": "..."}`;
    /// when the body is something else the status reason is used.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &[u8]) -> Self {
        let parsed: Option<WpErrorBody> = serde_json::from_slice(body).ok();
        let message = parsed
            .as_ref()
            .map(|b| b.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });

        match status.as_u16() {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            code => Self::Http {
                status: code,
                code: parsed.map(|b| b.code),
                message,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WpErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}
