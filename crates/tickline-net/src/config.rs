//! Transport configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;
/// Default receive timeout in seconds.
pub const DEFAULT_RECEIVE_TIMEOUT: u64 = 30;
/// Default send timeout in seconds.
pub const DEFAULT_SEND_TIMEOUT: u64 = 30;

/// Configuration for a [`ReqwestTransport`](crate::ReqwestTransport).
///
/// Timeouts are whole seconds and stand in for any phase a request leaves
/// at zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connect timeout in seconds.
    pub connect_timeout: u64,
    /// Receive timeout in seconds.
    pub receive_timeout: u64,
    /// Send timeout in seconds.
    pub send_timeout: u64,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Worker threads for the transport's I/O runtime.
    pub runtime_threads: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            follow_redirects: true,
            max_redirects: 10,
            user_agent: Some(format!("Tickline/{} (Rust)", env!("CARGO_PKG_VERSION"))),
            runtime_threads: 2,
        }
    }
}

/// Per-request timeouts with zeros replaced by configured defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedTimeouts {
    pub connect: Duration,
    pub receive: Duration,
    pub send: Duration,
}

impl ResolvedTimeouts {
    pub fn resolve(request: &tickline_core::Timeouts, config: &TransportConfig) -> Self {
        let pick = |requested: Option<Duration>, default: u64| {
            requested.unwrap_or(Duration::from_secs(default))
        };
        Self {
            connect: pick(request.connect(), config.connect_timeout),
            receive: pick(request.receive(), config.receive_timeout),
            send: pick(request.send(), config.send_timeout),
        }
    }

    /// Overall deadline for one request. Saturates instead of overflowing.
    pub fn total(&self) -> Duration {
        self.connect
            .saturating_add(self.send)
            .saturating_add(self.receive)
    }

    /// Key under which a client with these connect/receive settings is cached.
    pub fn client_key(&self) -> (Duration, Duration) {
        (self.connect, self.receive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickline_core::Timeouts;

    #[test]
    fn zero_timeouts_use_defaults() {
        let config = TransportConfig::default();
        let resolved = ResolvedTimeouts::resolve(&Timeouts::default(), &config);
        assert_eq!(resolved.connect, Duration::from_secs(10));
        assert_eq!(resolved.receive, Duration::from_secs(30));
        assert_eq!(resolved.send, Duration::from_secs(30));
        assert_eq!(resolved.total(), Duration::from_secs(70));
    }

    #[test]
    fn explicit_timeouts_win() {
        let config = TransportConfig::default();
        let resolved = ResolvedTimeouts::resolve(&Timeouts::new(2, 0, 5), &config);
        assert_eq!(resolved.client_key(), (Duration::from_secs(2), Duration::from_secs(30)));
        assert_eq!(resolved.total(), Duration::from_secs(37));
    }

    #[test]
    fn huge_timeouts_saturate_the_deadline() {
        let config = TransportConfig::default();
        let resolved = ResolvedTimeouts::resolve(&Timeouts::new(u64::MAX, 0, 0), &config);
        assert_eq!(resolved.connect, Duration::from_secs(u64::MAX));
        assert_eq!(resolved.total(), Duration::MAX);

        let all = ResolvedTimeouts::resolve(&Timeouts::new(u64::MAX, u64::MAX, u64::MAX), &config);
        assert_eq!(all.total(), Duration::MAX);
    }

    #[test]
    fn config_loads_partial_json() {
        let config: TransportConfig =
            serde_json::from_str(r#"{ "connect_timeout": 3, "follow_redirects": false }"#).unwrap();
        assert_eq!(config.connect_timeout, 3);
        assert!(!config.follow_redirects);
        assert_eq!(config.receive_timeout, DEFAULT_RECEIVE_TIMEOUT);
        assert_eq!(config.runtime_threads, 2);
    }
}
