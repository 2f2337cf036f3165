//! Verb-specific request functions.
//!
//! These wrap [`RequestEngine::submit`] for callers that only care whether a
//! request was accepted. `true` means the sink will be invoked exactly once
//! from a later tick, unless the engine is shut down first. `false` means
//! the request was rejected and the sink has already been dropped.
//!
//! Headers are raw `"Key: Value"` lines, sent in order. Lines without a
//! colon are skipped by the transport.

use std::path::Path;

use crate::download;
use crate::engine::RequestEngine;
use crate::error::Result;
use crate::logging::targets;
use crate::request::{HttpMethod, PostData, Request, Timeouts};
use crate::response::{RequestOutcome, SyncResponse};
use crate::sink::{CompletionSink, RequestId};

/// An empty header list.
pub const NO_HEADERS: &[&str] = &[];

fn header_lines<H: AsRef<str>>(headers: &[H]) -> impl Iterator<Item = String> + '_ {
    headers.iter().map(|line| line.as_ref().to_string())
}

impl RequestEngine {
    /// Submit a GET request.
    pub fn create_get_request<H: AsRef<str>>(
        &self,
        url: &str,
        sink: CompletionSink,
        headers: &[H],
        timeouts: Timeouts,
    ) -> bool {
        let request = Request::get(url)
            .headers(header_lines(headers))
            .timeouts(timeouts);
        self.accept(self.submit(request, sink), url)
    }

    /// Submit a POST request.
    ///
    /// Field data is form-urlencoded. The content type defaults to
    /// `application/x-www-form-urlencoded`.
    pub fn create_post_request<H: AsRef<str>>(
        &self,
        url: &str,
        sink: CompletionSink,
        data: impl Into<PostData>,
        content_type: Option<&str>,
        headers: &[H],
        timeouts: Timeouts,
    ) -> bool {
        self.submit_with_body(HttpMethod::Post, url, sink, data.into(), content_type, headers, timeouts)
    }

    /// Submit a form POST from parallel key and value columns.
    ///
    /// Returns `false` without invoking the sink when the columns differ in
    /// length.
    pub fn create_post_form_request<K, V, H>(
        &self,
        url: &str,
        sink: CompletionSink,
        keys: &[K],
        values: &[V],
        headers: &[H],
        timeouts: Timeouts,
    ) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
        H: AsRef<str>,
    {
        match PostData::from_columns(keys, values) {
            Ok(data) => self.submit_with_body(HttpMethod::Post, url, sink, data, None, headers, timeouts),
            Err(err) => self.accept(Err(err), url),
        }
    }

    /// Submit a PATCH request. Body handling matches
    /// [`create_post_request`](Self::create_post_request).
    pub fn create_patch_request<H: AsRef<str>>(
        &self,
        url: &str,
        sink: CompletionSink,
        data: impl Into<PostData>,
        content_type: Option<&str>,
        headers: &[H],
        timeouts: Timeouts,
    ) -> bool {
        self.submit_with_body(HttpMethod::Patch, url, sink, data.into(), content_type, headers, timeouts)
    }

    /// Submit a DELETE request.
    pub fn create_delete_request<H: AsRef<str>>(
        &self,
        url: &str,
        sink: CompletionSink,
        headers: &[H],
        timeouts: Timeouts,
    ) -> bool {
        let request = Request::delete(url)
            .headers(header_lines(headers))
            .timeouts(timeouts);
        self.accept(self.submit(request, sink), url)
    }

    /// Perform a GET request on the calling thread.
    ///
    /// Blocks until the response has been read. Never call this from the
    /// host's main thread.
    pub fn create_get_request_sync<H: AsRef<str>>(
        &self,
        url: &str,
        headers: &[H],
        timeouts: Timeouts,
    ) -> SyncResponse {
        let request = Request::get(url)
            .headers(header_lines(headers))
            .timeouts(timeouts);
        let outcome: RequestOutcome = self.submit_sync(&request);
        outcome.into()
    }

    /// Download `url` to `path` on the calling thread.
    ///
    /// Returns `true` once the file is complete. No partial file is left
    /// behind on failure.
    pub fn download_file<H: AsRef<str>>(&self, url: &str, path: impl AsRef<Path>, headers: &[H]) -> bool {
        download::download_file(self.transport().as_ref(), url, path, headers)
    }

    /// Submit a POST request with a `(success, body)` callback.
    #[deprecated(note = "use `create_post_request` with `CompletionSink::basic`")]
    pub fn create_post_request_basic<F, H>(
        &self,
        url: &str,
        callback: F,
        data: impl Into<PostData>,
        content_type: Option<&str>,
        headers: &[H],
        timeouts: Timeouts,
    ) -> bool
    where
        F: FnOnce(bool, String) + Send + 'static,
        H: AsRef<str>,
    {
        self.create_post_request(url, CompletionSink::basic(callback), data, content_type, headers, timeouts)
    }

    #[allow(clippy::too_many_arguments)]
    fn submit_with_body<H: AsRef<str>>(
        &self,
        method: HttpMethod,
        url: &str,
        sink: CompletionSink,
        data: PostData,
        content_type: Option<&str>,
        headers: &[H],
        timeouts: Timeouts,
    ) -> bool {
        let mut request = Request::new(method, url)
            .body(data.into_body())
            .headers(header_lines(headers))
            .timeouts(timeouts);
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        self.accept(self.submit(request, sink), url)
    }

    fn accept(&self, result: Result<RequestId>, url: &str) -> bool {
        match result {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(target: targets::ENGINE, url, "request rejected: {}", err);
                false
            }
        }
    }
}
