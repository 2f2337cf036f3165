//! reqwest-backed [`Transport`].
//!
//! Requests are driven to completion on a tokio runtime owned by the
//! transport. Every call blocks the calling worker thread until the
//! response body has been read, so the transport must be called from plain
//! threads and never from inside an async context.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use parking_lot::Mutex;
use reqwest::redirect::Policy;
use tickline_core::logging::targets;
use tickline_core::{
    HttpMethod, NetworkError, NetworkResult, Request, ResponseHeaders, Transport, TransportReply,
};
use tokio::runtime::Runtime;

use crate::config::{ResolvedTimeouts, TransportConfig};
use crate::error::network_error;

/// Upper bound on cached clients. The cache is cleared when it fills.
const MAX_CACHED_CLIENTS: usize = 16;

/// Builder for creating a transport with custom configuration.
#[derive(Default)]
pub struct ReqwestTransportBuilder {
    config: TransportConfig,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn with_config(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Set the default connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout.as_secs();
        self
    }

    /// Set the default receive timeout.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.receive_timeout = timeout.as_secs();
        self
    }

    /// Set the default send timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout.as_secs();
        self
    }

    /// Disable redirect following.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set the number of I/O runtime threads.
    pub fn runtime_threads(mut self, threads: usize) -> Self {
        self.config.runtime_threads = threads;
        self
    }

    /// Build the transport.
    pub fn build(self) -> NetworkResult<ReqwestTransport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.runtime_threads.max(1))
            .thread_name("tickline-io")
            .enable_all()
            .build()?;

        let transport = ReqwestTransport {
            runtime,
            clients: Mutex::new(HashMap::new()),
            config: self.config,
        };
        // Surface client configuration errors at build time.
        let defaults = ResolvedTimeouts::resolve(&Default::default(), &transport.config);
        transport.client_for(&defaults)?;
        Ok(transport)
    }
}

/// Blocking HTTP transport built on reqwest.
///
/// Clients are cached per connect/receive timeout pair and share the
/// transport's runtime. At most 16 clients are kept; hosts that vary
/// timeouts widely pay for rebuilding a client now and then.
///
/// # Panics
///
/// The transport owns a tokio runtime. Calling [`perform`](Transport::perform)
/// or [`download`](Transport::download) from inside an async context panics,
/// as does dropping the transport there. Hosts running under
/// `#[tokio::main]` must create and drop the engine that owns this transport
/// outside the runtime, for example from `spawn_blocking` or a plain thread.
pub struct ReqwestTransport {
    runtime: Runtime,
    clients: Mutex<HashMap<(Duration, Duration), reqwest::Client>>,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Create a transport with default configuration.
    pub fn new() -> NetworkResult<Self> {
        ReqwestTransportBuilder::new().build()
    }

    /// Create a builder for configuring a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Number of distinct clients built so far.
    pub fn cached_clients(&self) -> usize {
        self.clients.lock().len()
    }

    fn client_for(&self, timeouts: &ResolvedTimeouts) -> NetworkResult<reqwest::Client> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(&timeouts.client_key()) {
            return Ok(client.clone());
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.receive);

        if self.config.follow_redirects {
            builder = builder.redirect(Policy::limited(self.config.max_redirects));
        } else {
            builder = builder.redirect(Policy::none());
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        let client = builder.build().map_err(network_error)?;
        tracing::debug!(
            target: targets::TRANSPORT,
            connect = ?timeouts.connect,
            receive = ?timeouts.receive,
            "built HTTP client"
        );
        if clients.len() >= MAX_CACHED_CLIENTS {
            clients.clear();
        }
        clients.insert(timeouts.client_key(), client.clone());
        Ok(client)
    }

    fn prepare(&self, request: &Request) -> NetworkResult<reqwest::RequestBuilder> {
        let url = reqwest::Url::parse(&request.url)?;
        let timeouts = ResolvedTimeouts::resolve(&request.timeouts, &self.config);
        let client = self.client_for(&timeouts)?;

        let mut builder = client
            .request(method(request.method), url)
            .timeout(timeouts.total());

        let mut has_content_type = false;
        for (name, value) in request.header_pairs() {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            let value = HeaderValue::from_str(value)?;
            has_content_type |= name == CONTENT_TYPE;
            builder = builder.header(name, value);
        }

        if let Some(body) = &request.body {
            if !has_content_type {
                if let Some(content_type) = request.effective_content_type() {
                    builder = builder.header(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
                }
            }
            builder = builder.body(body.clone());
        }

        Ok(builder)
    }
}

impl Transport for ReqwestTransport {
    fn perform(&self, request: &Request) -> NetworkResult<TransportReply> {
        let builder = self.prepare(request)?;

        let reply = self.runtime.block_on(async move {
            let response = builder.send().await.map_err(network_error)?;
            let status = response.status().as_u16();
            let headers = collect_headers(response.headers());
            let body = response.text().await.map_err(network_error)?;
            Ok::<_, NetworkError>(TransportReply {
                status,
                body,
                headers,
            })
        })?;

        tracing::trace!(
            target: targets::TRANSPORT,
            method = %request.method,
            url = %request.url,
            status = reply.status,
            bytes = reply.body.len(),
            "response received"
        );
        Ok(reply)
    }

    fn download(&self, request: &Request, writer: &mut dyn Write) -> NetworkResult<u64> {
        let builder = self.prepare(request)?;

        self.runtime.block_on(async move {
            let mut response = builder.send().await.map_err(network_error)?;
            let status = response.status();
            if status.as_u16() >= 400 {
                return Err(NetworkError::HttpStatus {
                    status: status.as_u16(),
                    message: status.canonical_reason().map(str::to_string),
                });
            }

            let mut total = 0u64;
            while let Some(chunk) = response.chunk().await.map_err(network_error)? {
                writer.write_all(&chunk)?;
                total += chunk.len() as u64;
            }
            writer.flush()?;

            tracing::trace!(target: targets::TRANSPORT, bytes = total, "download streamed");
            Ok::<_, NetworkError>(total)
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .field("cached_clients", &self.cached_clients())
            .finish()
    }
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Lower-cased header names; the last value of a repeated header wins.
fn collect_headers(headers: &http::HeaderMap) -> ResponseHeaders {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
