//! The blocking HTTP transport seam.
//!
//! The engine never speaks HTTP itself. Each worker calls
//! [`Transport::perform`] once for its request; the synchronous entry points
//! call it on the caller's thread. `tickline-net` provides a reqwest-backed
//! implementation; tests and embedders can supply their own.

use std::io::Write;

use crate::error::{NetworkError, NetworkResult};
use crate::request::Request;
use crate::response::ResponseHeaders;

/// What a transport received for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
    /// Response headers, names lower-cased, last value wins.
    pub headers: ResponseHeaders,
}

/// A blocking HTTP client.
///
/// Implementations must be callable from many worker threads at once. A
/// zero in any of the request's [`Timeouts`](crate::Timeouts) means the
/// implementation's own default for that phase.
pub trait Transport: Send + Sync {
    /// Perform one request, blocking until the response body has been read.
    ///
    /// Network failures are returned as errors, never raised as panics.
    /// HTTP error statuses are not errors at this level.
    fn perform(&self, request: &Request) -> NetworkResult<TransportReply>;

    /// Stream the response body of `request` into `writer`.
    ///
    /// Returns the number of bytes written. A status of 400 or above is an
    /// error. The default implementation buffers the whole body through
    /// [`perform`](Self::perform); streaming transports should override it.
    fn download(&self, request: &Request, writer: &mut dyn Write) -> NetworkResult<u64> {
        let reply = self.perform(request)?;
        if reply.status >= 400 {
            return Err(NetworkError::HttpStatus {
                status: reply.status,
                message: None,
            });
        }
        writer.write_all(reply.body.as_bytes())?;
        writer.flush()?;
        Ok(reply.body.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u16);

    impl Transport for Fixed {
        fn perform(&self, _request: &Request) -> NetworkResult<TransportReply> {
            Ok(TransportReply {
                status: self.0,
                body: "payload".into(),
                headers: ResponseHeaders::new(),
            })
        }
    }

    #[test]
    fn default_download_writes_body() {
        let mut out = Vec::new();
        let written = Fixed(200)
            .download(&Request::get("http://example.test/f"), &mut out)
            .unwrap();
        assert_eq!(written, 7);
        assert_eq!(out, b"payload");
    }

    #[test]
    fn default_download_rejects_error_status() {
        let mut out = Vec::new();
        let err = Fixed(500)
            .download(&Request::get("http://example.test/f"), &mut out)
            .unwrap_err();
        assert_eq!(
            err,
            NetworkError::HttpStatus {
                status: 500,
                message: None
            }
        );
        assert!(out.is_empty());
    }
}
