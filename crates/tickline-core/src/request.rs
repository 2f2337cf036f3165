//! Request descriptors.
//!
//! Every facade entry point normalizes its arguments into a single
//! [`Request`], which is what workers and transports see.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RequestError, Result};

/// Content type applied to a request body when the caller gives none.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP request methods supported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PATCH method.
    Patch,
    /// HTTP DELETE method.
    Delete,
}

impl HttpMethod {
    /// The method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request timeouts, in whole seconds.
///
/// A value of zero means "use the transport's default" for that phase, not
/// "no timeout".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Connection establishment timeout.
    pub connect: u64,
    /// Response receive timeout.
    pub receive: u64,
    /// Request send timeout.
    pub send: u64,
}

impl Timeouts {
    /// Create a timeout triple.
    pub const fn new(connect: u64, receive: u64, send: u64) -> Self {
        Self {
            connect,
            receive,
            send,
        }
    }

    /// Whether every phase defers to the transport default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Connect timeout, or `None` for the transport default.
    pub fn connect(&self) -> Option<Duration> {
        non_zero_secs(self.connect)
    }

    /// Receive timeout, or `None` for the transport default.
    pub fn receive(&self) -> Option<Duration> {
        non_zero_secs(self.receive)
    }

    /// Send timeout, or `None` for the transport default.
    pub fn send(&self) -> Option<Duration> {
        non_zero_secs(self.send)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// A normalized HTTP request.
///
/// Headers are raw `"Key: Value"` lines. Their order is preserved and
/// duplicates are allowed; transports forward them as given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The request URL.
    pub url: String,
    /// Raw header lines.
    pub headers: Vec<String>,
    /// Request body.
    pub body: Option<String>,
    /// Content type override for the body.
    pub content_type: Option<String>,
    /// Per-request timeouts.
    pub timeouts: Timeouts,
}

impl Request {
    /// Create a request with no headers, body or timeouts.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            content_type: None,
            timeouts: Timeouts::default(),
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Create a POST request with a body.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url).body(body)
    }

    /// Create a PATCH request with a body.
    pub fn patch(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url).body(body)
    }

    /// Create a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Append a raw `"Key: Value"` header line.
    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    /// Append several raw header lines, keeping their order.
    pub fn headers<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Override the body content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the timeout triple.
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The content type a transport should send.
    ///
    /// `None` when there is no body. Form-urlencoded when there is a body and
    /// no override.
    pub fn effective_content_type(&self) -> Option<&str> {
        self.body.as_ref()?;
        Some(self.content_type.as_deref().unwrap_or(FORM_URLENCODED))
    }

    /// Parsed header lines, skipping lines without a `:` separator.
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().filter_map(|line| parse_header_line(line))
    }

    /// Check that the request can be submitted.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(RequestError::EmptyUrl);
        }
        url::Url::parse(&self.url).map_err(|err| RequestError::InvalidUrl {
            url: self.url.clone(),
            reason: err.to_string(),
        })?;
        Ok(())
    }
}

/// Split a raw `"Key: Value"` header line.
///
/// The name is everything before the first colon, the value everything
/// after it; both are trimmed. Returns `None` for lines without a colon or
/// with an empty name.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// The payload of a POST or PATCH request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostData {
    /// A body sent as-is.
    Raw(String),
    /// Key/value fields sent form-urlencoded.
    Fields(Vec<(String, String)>),
}

impl PostData {
    /// Pair up parallel key and value columns.
    ///
    /// Fails when the columns have different lengths.
    pub fn from_columns<K, V>(keys: &[K], values: &[V]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if keys.len() != values.len() {
            return Err(RequestError::FormFieldMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        Ok(Self::Fields(
            keys.iter()
                .zip(values)
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        ))
    }

    /// Encode into the body string sent on the wire.
    pub fn into_body(self) -> String {
        match self {
            Self::Raw(body) => body,
            Self::Fields(fields) => url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields)
                .finish(),
        }
    }
}

impl From<String> for PostData {
    fn from(body: String) -> Self {
        Self::Raw(body)
    }
}

impl From<&str> for PostData {
    fn from(body: &str) -> Self {
        Self::Raw(body.to_string())
    }
}

impl From<Vec<(String, String)>> for PostData {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self::Fields(fields)
    }
}
