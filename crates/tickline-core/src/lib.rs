//! Core of Tickline.
//!
//! Tickline issues HTTP requests from single-threaded hosts (game engines,
//! editors, plugin runtimes) without ever blocking the host's main thread,
//! and delivers every result back on that thread:
//!
//! - **Engine**: [`RequestEngine`] owns the result queue and dispatches
//!   requests to background threads
//! - **Pump**: [`RequestEngine::tick`] runs completion callbacks, once per
//!   host cycle, on the thread that built the engine
//! - **Facade**: verb-specific helpers such as
//!   [`RequestEngine::create_get_request`] that report acceptance as `bool`
//! - **Downloads**: blocking file downloads that never leave partial files
//! - **Transport**: the [`Transport`] trait; `tickline-net` provides a
//!   reqwest-backed implementation
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tickline_core::{
//!     CompletionSink, NetworkResult, Request, RequestEngine, ResponseHeaders, Timeouts,
//!     Transport, TransportReply, NO_HEADERS,
//! };
//!
//! struct Canned;
//!
//! impl Transport for Canned {
//!     fn perform(&self, _request: &Request) -> NetworkResult<TransportReply> {
//!         Ok(TransportReply {
//!             status: 200,
//!             body: "hello".into(),
//!             headers: ResponseHeaders::new(),
//!         })
//!     }
//! }
//!
//! let engine = RequestEngine::new(Canned)?;
//!
//! let accepted = engine.create_get_request(
//!     "https://api.example.com/greeting",
//!     CompletionSink::basic(|ok, body| assert!(ok && body == "hello")),
//!     NO_HEADERS,
//!     Timeouts::default(),
//! );
//! assert!(accepted);
//!
//! // Normally the host calls tick() from its update hook every frame.
//! engine.wait_idle(Duration::from_secs(5));
//! assert_eq!(engine.tick(), 1);
//! # Ok::<(), tickline_core::RequestError>(())
//! ```

mod dispatch;
pub mod download;
mod engine;
mod error;
mod facade;
pub mod logging;
mod queue;
mod request;
mod response;
mod sink;
pub mod thread_check;
mod transport;

pub use dispatch::DispatchMode;
pub use engine::{EngineBuilder, EngineConfig, RequestEngine};
pub use error::{NetworkError, NetworkResult, RequestError, Result};
pub use facade::NO_HEADERS;
pub use queue::ResultQueue;
pub use request::{FORM_URLENCODED, HttpMethod, PostData, Request, Timeouts, parse_header_line};
pub use response::{NO_STATUS, RequestOutcome, ResponseHeaders, SyncResponse};
pub use sink::{BasicCallback, CompletionSink, DetailedCallback, QueuedCompletion, RequestId};
pub use thread_check::ThreadAffinity;
pub use transport::{Transport, TransportReply};
