use thiserror::Error;

/// Application-wide error types for forager.
#[derive(Error, Debug)]
pub enum AppError {
    /// The target answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// HTTP request failed for a reason other than transport or status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error (connect refused, DNS, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// No proxy pool to draw from: the listing fetch failed, or every
    /// source together produced zero proxies. Fatal for the run.
    #[error("Proxy listing unavailable: {0}")]
    ProxyPool(String),

    /// Override proxy string does not match `scheme://ip:port`.
    #[error("Invalid proxy override '{0}': expected http(s)://ip:port")]
    InvalidProxy(String),

    /// The target URL itself is malformed. Retrying will not fix it.
    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    /// Expected markup structure absent from a fetched page.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Schema loading or instance validation failed.
    #[error("Schema error: {0}")]
    Schema(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying
    /// through another proxy draw.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::HttpStatus { .. } | AppError::Timeout(_) | AppError::Network(_) => true,
            AppError::Http(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}
