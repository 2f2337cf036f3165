//! Request outcomes.

use std::collections::HashMap;

use crate::error::NetworkResult;
use crate::transport::TransportReply;

/// Response headers keyed by lower-cased name. The last value wins when a
/// header repeats.
pub type ResponseHeaders = HashMap<String, String>;

/// Status code recorded when no HTTP status was obtained.
pub const NO_STATUS: u16 = 0;

/// The outcome of one request, as delivered to its completion sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOutcome {
    /// Whether the request succeeded.
    pub success: bool,
    /// HTTP status code, or [`NO_STATUS`] for transport failures.
    pub status: u16,
    /// Response body on success, error text on failure.
    pub body: String,
    /// Response headers, empty for transport failures.
    pub headers: ResponseHeaders,
}

impl RequestOutcome {
    /// Build an outcome from a transport result.
    ///
    /// - transport error: `success = false`, no status, error text as body
    /// - status 400 and above: `success = false`, body is `"<status> <reason>"`
    /// - anything else: `success = true` with the received body
    pub fn from_transport(result: NetworkResult<TransportReply>) -> Self {
        match result {
            Ok(reply) if reply.status >= 400 => Self {
                success: false,
                status: reply.status,
                body: status_line(reply.status),
                headers: reply.headers,
            },
            Ok(reply) => Self {
                success: true,
                status: reply.status,
                body: reply.body,
                headers: reply.headers,
            },
            Err(err) => Self::failure(err.to_string()),
        }
    }

    /// An outcome for a request that failed before any status was obtained.
    pub fn failure(message: impl Into<String>) -> Self {
        let mut body = message.into();
        if body.is_empty() {
            body = "request failed".to_string();
        }
        Self {
            success: false,
            status: NO_STATUS,
            body,
            headers: ResponseHeaders::new(),
        }
    }

    /// The status as a three-digit code string, `"000"` for transport failures.
    pub fn status_code_text(&self) -> String {
        format!("{:03}", self.status)
    }

    /// Whether the request failed before any HTTP status was received.
    pub fn is_transport_failure(&self) -> bool {
        self.status == NO_STATUS
    }
}

fn status_line(status: u16) -> String {
    let reason = http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason());
    match reason {
        Some(reason) => format!("{status} {reason}"),
        None => status.to_string(),
    }
}

/// Result of a synchronous request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// HTTP status code, 0 when the request never got one.
    pub status_code: u16,
    /// Response body on success, error text on failure.
    pub result: String,
}

impl From<RequestOutcome> for SyncResponse {
    fn from(outcome: RequestOutcome) -> Self {
        Self {
            success: outcome.success,
            status_code: outcome.status,
            result: outcome.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;

    fn reply(status: u16, body: &str) -> TransportReply {
        TransportReply {
            status,
            body: body.to_string(),
            headers: ResponseHeaders::from([("x-id".to_string(), "9".to_string())]),
        }
    }

    #[test]
    fn success_keeps_body_and_headers() {
        let outcome = RequestOutcome::from_transport(Ok(reply(200, "hi")));
        assert!(outcome.success);
        assert_eq!(outcome.body, "hi");
        assert_eq!(outcome.headers.get("x-id").map(String::as_str), Some("9"));
    }

    #[test]
    fn error_status_becomes_status_line() {
        let outcome = RequestOutcome::from_transport(Ok(reply(404, "<html>")));
        assert!(!outcome.success);
        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.body, "404 Not Found");
        assert_eq!(outcome.headers.len(), 1);

        let odd = RequestOutcome::from_transport(Ok(reply(599, "")));
        assert_eq!(odd.body, "599");
    }

    #[test]
    fn transport_error_uses_placeholder_status() {
        let outcome = RequestOutcome::from_transport(Err(NetworkError::Timeout));
        assert!(!outcome.success);
        assert!(outcome.is_transport_failure());
        assert_eq!(outcome.status_code_text(), "000");
        assert_eq!(outcome.body, "Request timed out");
        assert!(outcome.headers.is_empty());
    }

    #[test]
    fn failure_body_is_never_empty() {
        assert_eq!(RequestOutcome::failure("").body, "request failed");
    }

    #[test]
    fn sync_response_from_outcome() {
        let sync: SyncResponse = RequestOutcome::from_transport(Ok(reply(201, "made"))).into();
        assert_eq!(
            sync,
            SyncResponse {
                success: true,
                status_code: 201,
                result: "made".into()
            }
        );
    }
}
