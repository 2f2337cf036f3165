//! Mapping reqwest failures onto [`NetworkError`].

use tickline_core::NetworkError;

/// Classify a reqwest error.
pub(crate) fn network_error(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout
    } else if err.is_connect() {
        NetworkError::Connection(err.to_string())
    } else if err.is_redirect() {
        NetworkError::TooManyRedirects
    } else if err.is_builder() {
        NetworkError::InvalidUrl(err.to_string())
    } else {
        NetworkError::Request(err.to_string())
    }
}
