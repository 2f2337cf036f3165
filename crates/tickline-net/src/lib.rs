//! reqwest-backed transport for Tickline.
//!
//! [`ReqwestTransport`] implements [`tickline_core::Transport`] on top of a
//! reqwest client and a tokio runtime owned by the transport, so a host
//! needs no async runtime of its own:
//!
//! ```no_run
//! use tickline_core::{CompletionSink, RequestEngine, Timeouts, NO_HEADERS};
//! use tickline_net::ReqwestTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RequestEngine::new(ReqwestTransport::new()?)?;
//!
//! engine.create_get_request(
//!     "https://api.example.com/status",
//!     CompletionSink::detailed(|ok, body, headers| {
//!         println!("{ok} {body} ({} headers)", headers.len());
//!     }),
//!     NO_HEADERS,
//!     Timeouts::new(5, 10, 10),
//! );
//!
//! // From the host's per-frame hook:
//! engine.tick();
//! # Ok(())
//! # }
//! ```
//!
//! ## Timeouts
//!
//! A request's connect timeout bounds connection setup and its receive
//! timeout bounds each read. The send timeout extends the overall deadline,
//! which is the sum of all three. Zero selects the value from
//! [`TransportConfig`].

mod config;
mod error;
mod transport;

pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_RECEIVE_TIMEOUT, DEFAULT_SEND_TIMEOUT, TransportConfig,
};
pub use transport::{ReqwestTransport, ReqwestTransportBuilder};
