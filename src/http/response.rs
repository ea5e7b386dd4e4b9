use std::borrow::Cow;
use std::time::SystemTime;

use crate::http::SERVER_NAME;
use crate::http::headers::Headers;

/// The statuses this server can answer with. Anything else is out of scope
/// for a read-only file server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Default reason phrase. Responses may carry their own, see
    /// [`Response::reason`].
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A response as it will appear on the wire, minus the version token.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    /// Reason phrase written on the status line
    pub reason: Cow<'static, str>,
    /// HTTP headers in write order; duplicates allowed
    pub headers: Headers,
    /// Response body, absent for HEAD and bodiless statuses
    pub body: Option<Vec<u8>>,
}

/// Fluent response construction.
///
/// ```
/// # use lantern::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::standard(StatusCode::NotFound)
///     .reason("File not found")
///     .build();
/// assert_eq!(response.header("Content-Length"), Some("0"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    reason: Option<Cow<'static, str>>,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl ResponseBuilder {
    /// A bare builder with no headers at all.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a builder pre-populated with the headers every response
    /// carries: `Date`, `Connection: close` and `Server`.
    pub fn standard(status: StatusCode) -> Self {
        Self::new(status)
            .header("Date", httpdate::fmt_http_date(SystemTime::now()))
            .header("Connection", "close")
            .header("Server", SERVER_NAME)
    }

    /// Overrides the reason phrase. Defaults to the status code's standard one.
    pub fn reason(mut self, reason: impl Into<Cow<'static, str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Appends a header even if one with the same name is already present.
    pub fn append_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds `Content-Length` from the body size (0 when absent) unless the
    /// header was already set, which is how HEAD responses advertise the
    /// length a GET would return.
    pub fn build(mut self) -> Response {
        if !self.headers.contains("Content-Length") {
            let len = self.body.as_ref().map_or(0, Vec::len);
            self.headers.append("Content-Length", len.to_string());
        }

        Response {
            status: self.status,
            reason: self
                .reason
                .unwrap_or(Cow::Borrowed(self.status.reason_phrase())),
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Plain-text error response with the standard headers.
    pub fn error(
        status: StatusCode,
        reason: impl Into<Cow<'static, str>>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        ResponseBuilder::standard(status)
            .reason(reason)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body.into())
            .build()
    }

    /// The last-resort 500 response. Cannot fail.
    pub fn internal_error() -> Self {
        Self::error(
            StatusCode::InternalServerError,
            "Internal Server Error",
            b"Internal Server Error".to_vec(),
        )
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Number of body bytes that will be written.
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }
}
