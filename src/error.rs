use reqwest::StatusCode;

/// Failure to obtain a single metric from the explorer or exchange.
///
/// Every variant degrades the affected metric to `MetricValue::Missing`;
/// the distinction only shows up in logs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// Body was not the number or JSON document we expected
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure of a call against the chat platform.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Transport-level failure talking to the platform
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform rejected the call
    #[error("platform API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Response could not be decoded into the expected shape
    #[error("failed to decode platform response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
