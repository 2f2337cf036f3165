//! Error types for Tickline.
//!
//! Two families exist. [`RequestError`] is returned synchronously when a
//! request is rejected at submission time; no callback ever runs for it.
//! [`NetworkError`] describes a transport failure and only ever travels
//! inside a completed request, where it becomes the body of a
//! `success = false` outcome.

use thiserror::Error;

/// Errors raised while submitting a request to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The request URL was empty.
    #[error("request URL is empty")]
    EmptyUrl,
    /// The request URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why parsing failed.
        reason: String,
    },
    /// Form keys and values had different lengths.
    #[error("form field mismatch: {keys} keys but {values} values")]
    FormFieldMismatch {
        /// Number of keys supplied.
        keys: usize,
        /// Number of values supplied.
        values: usize,
    },
    /// The engine has been shut down and accepts no more work.
    #[error("request engine has been shut down")]
    ShutDown,
    /// The bounded dispatch queue is full.
    #[error("dispatch queue is full")]
    QueueFull,
    /// A worker thread could not be spawned.
    #[error("failed to spawn request thread: {0}")]
    Spawn(String),
    /// An engine was built without a transport.
    #[error("no transport configured")]
    MissingTransport,
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),
    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// TLS/SSL error.
    #[error("TLS error: {0}")]
    Tls(String),
    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
    /// HTTP error status (4xx or 5xx).
    #[error("HTTP {status}{}", status_suffix(.message))]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Optional error message from the response body.
        message: Option<String>,
    },
    /// Redirect limit exceeded.
    #[error("Too many redirects")]
    TooManyRedirects,
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|msg| format!(": {msg}"))
        .unwrap_or_default()
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<RequestError> for NetworkError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::EmptyUrl | RequestError::InvalidUrl { .. } => {
                Self::InvalidUrl(err.to_string())
            }
            other => Self::Request(other.to_string()),
        }
    }
}

/// A specialized Result type for request submission.
pub type Result<T> = std::result::Result<T, RequestError>;

/// A specialized Result type for transport operations.
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;
