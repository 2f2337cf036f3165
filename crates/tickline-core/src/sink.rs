//! Completion sinks and queued deliveries.
//!
//! A [`CompletionSink`] is the caller's callback. It travels with its
//! request to a worker and back, and is consumed exactly once, on the main
//! thread, when the pump delivers the [`QueuedCompletion`] that carries it.
//!
//! # Callback Shapes
//!
//! Two shapes exist, matching what hosts historically registered:
//!
//! - [`CompletionSink::Basic`] receives `(success, body)`.
//! - [`CompletionSink::Detailed`] additionally receives the response headers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::response::{RequestOutcome, ResponseHeaders};

/// Global counter for request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a submitted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this request ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callback receiving `(success, body)`.
pub type BasicCallback = Box<dyn FnOnce(bool, String) + Send + 'static>;

/// Callback receiving `(success, body, response_headers)`.
pub type DetailedCallback = Box<dyn FnOnce(bool, String, ResponseHeaders) + Send + 'static>;

/// A user callback awaiting a request outcome.
pub enum CompletionSink {
    /// Receives the success flag and body.
    Basic(BasicCallback),
    /// Receives the success flag, body and response headers.
    Detailed(DetailedCallback),
}

impl CompletionSink {
    /// Wrap a `(success, body)` callback.
    pub fn basic<F>(callback: F) -> Self
    where
        F: FnOnce(bool, String) + Send + 'static,
    {
        Self::Basic(Box::new(callback))
    }

    /// Wrap a `(success, body, headers)` callback.
    pub fn detailed<F>(callback: F) -> Self
    where
        F: FnOnce(bool, String, ResponseHeaders) + Send + 'static,
    {
        Self::Detailed(Box::new(callback))
    }

    /// Whether this sink wants response headers.
    pub fn wants_headers(&self) -> bool {
        matches!(self, Self::Detailed(_))
    }

    /// Invoke the callback with an outcome, consuming the sink.
    pub fn complete(self, outcome: RequestOutcome) {
        match self {
            Self::Basic(callback) => callback(outcome.success, outcome.body),
            Self::Detailed(callback) => callback(outcome.success, outcome.body, outcome.headers),
        }
    }
}

impl fmt::Debug for CompletionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(_) => f.write_str("CompletionSink::Basic"),
            Self::Detailed(_) => f.write_str("CompletionSink::Detailed"),
        }
    }
}

/// A finished request waiting for main-thread delivery.
#[derive(Debug)]
pub struct QueuedCompletion {
    id: RequestId,
    outcome: RequestOutcome,
    sink: CompletionSink,
}

impl QueuedCompletion {
    /// Pair an outcome with the sink that should receive it.
    pub fn new(id: RequestId, outcome: RequestOutcome, sink: CompletionSink) -> Self {
        Self { id, outcome, sink }
    }

    /// The request this completion belongs to.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The outcome that will be delivered.
    pub fn outcome(&self) -> &RequestOutcome {
        &self.outcome
    }

    /// Execute the delivery.
    pub fn deliver(self) {
        self.sink.complete(self.outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn outcome() -> RequestOutcome {
        RequestOutcome {
            success: true,
            status: 200,
            body: "ok".into(),
            headers: ResponseHeaders::from([("etag".to_string(), "v1".to_string())]),
        }
    }

    #[test]
    fn basic_sink_receives_success_and_body() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let sink = CompletionSink::basic(move |ok, body| {
            *seen_clone.lock() = Some((ok, body));
        });
        assert!(!sink.wants_headers());

        sink.complete(outcome());
        assert_eq!(*seen.lock(), Some((true, "ok".to_string())));
    }

    #[test]
    fn detailed_sink_receives_headers() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let sink = CompletionSink::detailed(move |ok, body, headers| {
            *seen_clone.lock() = Some((ok, body, headers));
        });
        assert!(sink.wants_headers());

        QueuedCompletion::new(RequestId::next(), outcome(), sink).deliver();
        let (ok, body, headers) = seen.lock().take().unwrap();
        assert!(ok);
        assert_eq!(body, "ok");
        assert_eq!(headers.get("etag").map(String::as_str), Some("v1"));
    }

    #[test]
    fn request_ids_are_unique_and_ordered() {
        let a = RequestId::next();
        let b = RequestId::next();
        assert!(b > a);
        assert_eq!(format!("{a}"), format!("#{}", a.as_u64()));
    }
}
