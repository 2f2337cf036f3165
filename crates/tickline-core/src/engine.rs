//! The request engine and its main-thread pump.
//!
//! A [`RequestEngine`] is constructed once by the host, on its main thread,
//! and passed by reference to whatever code issues requests. Requests run on
//! background threads; their outcomes wait in a [`ResultQueue`] until the
//! host calls [`RequestEngine::tick`] from its per-cycle update hook, which
//! is the only place completion callbacks ever run.
//!
//! # Example
//!
//! ```ignore
//! use tickline_core::{CompletionSink, Request, RequestEngine};
//!
//! let engine = RequestEngine::builder()
//!     .thread_name("plugin-http")
//!     .transport(my_transport)
//!     .build()?;
//!
//! engine.submit(
//!     Request::get("https://api.example.com/status"),
//!     CompletionSink::basic(|ok, body| println!("{ok}: {body}")),
//! )?;
//!
//! // In the host's update hook, once per frame:
//! engine.tick();
//! ```
//!
//! # Shutdown
//!
//! [`RequestEngine::shutdown`] (also run on drop) abandons outstanding work:
//! queued outcomes are dropped without invoking their callbacks, requests
//! still talking to the network finish on their own and their outcomes are
//! discarded. Hosts that prefer to drain first call
//! [`RequestEngine::wait_idle`] followed by a final `tick()`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::dispatch::{DispatchMode, Dispatcher, ThreadSettings};
use crate::error::{NetworkError, RequestError, Result};
use crate::logging::{panic_message, span_names, targets};
use crate::queue::ResultQueue;
use crate::request::Request;
use crate::response::RequestOutcome;
use crate::sink::{CompletionSink, QueuedCompletion, RequestId};
use crate::thread_check::ThreadAffinity;
use crate::transport::Transport;

/// Configuration for creating a [`RequestEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix for worker thread names.
    pub thread_name: String,
    /// Stack size for worker threads in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// How requests are mapped onto threads.
    pub dispatch: DispatchMode,
    /// Whether transport failures are kept out of the log.
    pub suppress_errors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_name: "tickline-request".to_string(),
            stack_size: None,
            dispatch: DispatchMode::default(),
            suppress_errors: false,
        }
    }
}

/// Builder for creating engines with custom configuration.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl EngineBuilder {
    /// Create a builder with default settings and no transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Set the worker thread name prefix.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Set the stack size for worker threads.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the dispatch mode.
    pub fn dispatch(mut self, mode: DispatchMode) -> Self {
        self.config.dispatch = mode;
        self
    }

    /// Keep transport failures out of the log.
    pub fn suppress_errors(mut self, suppress: bool) -> Self {
        self.config.suppress_errors = suppress;
        self
    }

    /// Set the transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set an already shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the engine on the current thread, which becomes its main thread.
    pub fn build(self) -> Result<RequestEngine> {
        let transport = self.transport.ok_or(RequestError::MissingTransport)?;
        RequestEngine::with_config(self.config, transport)
    }
}

/// Tracks requests that have been dispatched but not yet queued.
#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn begin(&self) {
        *self.count.lock() += 1;
    }

    fn end(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn get(&self) -> usize {
        *self.count.lock()
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

/// State shared between the engine handle and its workers.
struct EngineShared {
    queue: ResultQueue,
    in_flight: InFlight,
    suppress_errors: AtomicBool,
    transport: Arc<dyn Transport>,
}

impl EngineShared {
    /// Call the transport, converting failures and panics into an outcome.
    fn perform(&self, request: &Request) -> RequestOutcome {
        let reply = panic::catch_unwind(AssertUnwindSafe(|| self.transport.perform(request)))
            .unwrap_or_else(|payload| {
                Err(NetworkError::Request(format!(
                    "transport panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        if let Err(err) = &reply {
            if !self.suppress_errors.load(Ordering::Relaxed) {
                tracing::warn!(
                    target: targets::DISPATCH,
                    method = %request.method,
                    url = %request.url,
                    "request failed: {}",
                    err
                );
            }
        }

        RequestOutcome::from_transport(reply)
    }
}

/// Decrements the in-flight count when a work unit finishes or is dropped.
struct InFlightGuard(Arc<EngineShared>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.end();
    }
}

/// One request travelling to a worker.
struct WorkUnit {
    id: RequestId,
    request: Request,
    sink: CompletionSink,
    guard: InFlightGuard,
}

impl WorkUnit {
    fn execute(self) {
        let Self {
            id,
            request,
            sink,
            guard,
        } = self;
        let shared = &guard.0;

        let span = tracing::debug_span!(
            target: targets::DISPATCH,
            span_names::REQUEST,
            %id,
            method = %request.method
        );
        let _entered = span.enter();

        let outcome = shared.perform(&request);
        tracing::debug!(
            target: targets::DISPATCH,
            success = outcome.success,
            status = outcome.status,
            "request finished"
        );
        shared.queue.push(QueuedCompletion::new(id, outcome, sink));
    }
}

/// Background HTTP dispatch with main-thread delivery.
///
/// `RequestEngine` is `Send + Sync`; requests may be submitted from any
/// thread. Callbacks only run inside [`tick`](Self::tick).
pub struct RequestEngine {
    shared: Arc<EngineShared>,
    dispatcher: Dispatcher,
    affinity: ThreadAffinity,
    shut_down: AtomicBool,
}

impl RequestEngine {
    /// Create an engine with default configuration.
    ///
    /// The calling thread becomes the engine's main thread.
    pub fn new(transport: impl Transport + 'static) -> Result<Self> {
        Self::with_config(EngineConfig::default(), Arc::new(transport))
    }

    /// Create a builder for configuring a new engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: EngineConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let dispatcher = Dispatcher::new(
            config.dispatch,
            ThreadSettings {
                name: config.thread_name.clone(),
                stack_size: config.stack_size,
            },
        )?;

        tracing::debug!(
            target: targets::ENGINE,
            dispatch = ?config.dispatch,
            thread_name = %config.thread_name,
            "request engine created"
        );

        Ok(Self {
            shared: Arc::new(EngineShared {
                queue: ResultQueue::new(),
                in_flight: InFlight::default(),
                suppress_errors: AtomicBool::new(config.suppress_errors),
                transport,
            }),
            dispatcher,
            affinity: ThreadAffinity::current(),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Submit a request for background execution.
    ///
    /// Returns as soon as the request has been handed off. On success the
    /// sink is invoked exactly once from a later [`tick`](Self::tick),
    /// unless the engine is shut down first. On error the sink is dropped
    /// without being invoked.
    pub fn submit(&self, request: Request, sink: CompletionSink) -> Result<RequestId> {
        if self.is_shut_down() {
            return Err(RequestError::ShutDown);
        }
        request.validate()?;

        let id = RequestId::next();
        let method = request.method;
        self.shared.in_flight.begin();
        let unit = WorkUnit {
            id,
            request,
            sink,
            guard: InFlightGuard(self.shared.clone()),
        };

        self.dispatcher.run(id, Box::new(move || unit.execute()))?;
        tracing::trace!(target: targets::DISPATCH, %id, %method, "request dispatched");
        Ok(id)
    }

    /// Perform a request on the calling thread and return its outcome.
    ///
    /// Never touches the result queue. This blocks for the full duration of
    /// the request and must not be called from the host's main thread.
    pub fn submit_sync(&self, request: &Request) -> RequestOutcome {
        if self.affinity.is_same_thread() {
            tracing::warn!(
                target: targets::ENGINE,
                url = %request.url,
                "blocking request issued from the main thread"
            );
        }
        if let Err(err) = request.validate() {
            return RequestOutcome::failure(err.to_string());
        }
        self.shared.perform(request)
    }

    /// Deliver every completed request to its callback.
    ///
    /// Call exactly once per host cycle, from the thread that built the
    /// engine. Callbacks run in completion order. A panicking callback is
    /// logged and does not stop delivery of the rest of the batch. If a
    /// callback shuts the engine down, the remaining entries are dropped
    /// without being invoked. Returns the number of callbacks invoked.
    pub fn tick(&self) -> usize {
        self.affinity
            .debug_assert_same_thread_with_msg("RequestEngine::tick must run on the host main thread");

        let entries = self.shared.queue.drain_all();
        if entries.is_empty() {
            return 0;
        }

        let span = tracing::trace_span!(target: targets::PUMP, span_names::TICK, count = entries.len());
        let _entered = span.enter();

        let mut delivered = 0;
        let mut entries = entries.into_iter();
        for entry in entries.by_ref() {
            // A callback may shut the engine down; the rest of the batch is abandoned.
            if self.is_shut_down() {
                drop(entry);
                break;
            }
            delivered += 1;
            let id = entry.id();
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| entry.deliver())) {
                tracing::error!(
                    target: targets::PUMP,
                    %id,
                    "completion callback panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }

        let abandoned = entries.len();
        if abandoned > 0 {
            tracing::debug!(target: targets::PUMP, abandoned, "engine shut down during tick");
        }
        delivered
    }

    /// Number of completed requests waiting for the next tick.
    pub fn pending_results(&self) -> usize {
        self.shared.queue.len()
    }

    /// Number of requests dispatched but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.get()
    }

    /// Block until no request is in flight or the timeout elapses.
    ///
    /// Returns `true` if the engine became idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.shared.in_flight.wait_idle(timeout)
    }

    /// Keep transport failures out of the log.
    pub fn set_suppress_errors(&self, suppress: bool) {
        self.shared.suppress_errors.store(suppress, Ordering::Relaxed);
    }

    /// Whether transport failures are kept out of the log.
    pub fn suppress_errors(&self) -> bool {
        self.shared.suppress_errors.load(Ordering::Relaxed)
    }

    /// The transport this engine dispatches to.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.shared.transport
    }

    /// The main thread recorded at construction.
    pub fn main_thread(&self) -> ThreadAffinity {
        self.affinity
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Stop the engine, abandoning outstanding work.
    ///
    /// Queued outcomes are dropped without invoking their callbacks, new
    /// submissions are rejected, and in-flight requests have their outcomes
    /// discarded when they finish. Does not block. Returns the number of
    /// queued outcomes that were dropped. Idempotent.
    pub fn shutdown(&self) -> usize {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return 0;
        }
        self.dispatcher.shutdown();
        let dropped = self.shared.queue.close();
        tracing::debug!(
            target: targets::ENGINE,
            dropped,
            in_flight = self.in_flight(),
            "request engine shut down"
        );
        dropped
    }
}

impl Drop for RequestEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for RequestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEngine")
            .field("main_thread", &self.affinity.thread_id())
            .field("in_flight", &self.in_flight())
            .field("pending_results", &self.pending_results())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
