//! Logging facilities for Tickline.
//!
//! Tickline uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. Hosts that want to see engine diagnostics install one:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("tickline_core::dispatch=debug,tickline_net=info")
//!     .init();
//! ```
//!
//! Transport failures are logged at `warn` by the worker that observed them.
//! Hosts that report failures through their callbacks anyway can silence
//! these with [`RequestEngine::set_suppress_errors`](crate::RequestEngine::set_suppress_errors).

/// Span names used throughout Tickline for tracing.
pub mod span_names {
    /// One pass of the main-thread pump.
    pub const TICK: &str = "tickline::tick";
    /// Execution of a single request on a worker.
    pub const REQUEST: &str = "tickline::request";
    /// A synchronous file download.
    pub const DOWNLOAD: &str = "tickline::download";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Engine lifecycle target.
    pub const ENGINE: &str = "tickline_core::engine";
    /// Worker dispatch target.
    pub const DISPATCH: &str = "tickline_core::dispatch";
    /// Main-thread pump target.
    pub const PUMP: &str = "tickline_core::pump";
    /// Result queue target.
    pub const QUEUE: &str = "tickline_core::queue";
    /// File download target.
    pub const DOWNLOAD: &str = "tickline_core::download";
    /// Transport implementations target.
    pub const TRANSPORT: &str = "tickline_net::transport";
}

/// Render a panic payload captured by `catch_unwind` as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_handles_both_payload_kinds() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 7");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
