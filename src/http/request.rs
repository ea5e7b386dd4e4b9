use bytes::Bytes;
use std::fmt;

use crate::http::headers::Headers;

/// Request method token.
///
/// Only GET and HEAD are served. Every other token still parses so the
/// handler can answer it with 405 instead of rejecting the request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    /// Same headers as GET, no body.
    HEAD,
    POST,
    PUT,
    DELETE,
    OPTIONS,
    PATCH,
    /// Any other token, case preserved.
    Extension(String),
}

/// One parsed request: request line plus header block.
///
/// Requests are immutable once parsed. No body is ever read; `pending` holds
/// whatever bytes the connection had already buffered past the header block.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, HEAD, ...)
    pub method: Method,
    /// The raw request target as sent (e.g. "/docs/a%20b.txt?x=1")
    pub target: String,
    /// HTTP version token (always "HTTP/1.1" once parsed)
    pub version: String,
    /// Request headers in the order received
    pub headers: Headers,
    /// Bytes read from the connection but not consumed by the parser
    pub pending: Bytes,
}

/// Assembles requests by hand, mostly for tests.
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    headers: Headers,
}

impl Method {
    /// Matching is case-sensitive, as in HTTP.
    ///
    /// ```
    /// # use lantern::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Extension("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            other => Method::Extension(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Extension(s) => s,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            headers: Headers::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            target: self.target.ok_or("target missing")?,
            version: "HTTP/1.1".to_string(),
            headers: self.headers,
            pending: Bytes::new(),
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves the first header value by name, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// The `Host` header, if present and non-empty.
    pub fn host(&self) -> Option<&str> {
        self.header("Host").filter(|h| !h.is_empty())
    }

    /// Whether the handler will answer this method with content.
    pub fn is_read_only(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD)
    }
}
