use std::borrow::Cow;

use thiserror::Error;

use crate::http::response::{Response, StatusCode};

/// A client-caused failure that is answered with an error response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} {reason}", status.as_u16())]
pub struct ProtocolError {
    pub status: StatusCode,
    pub reason: Cow<'static, str>,
    /// Body override; the reason is used when absent.
    pub body: Option<String>,
}

impl ProtocolError {
    pub fn new(status: StatusCode, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: None,
        }
    }

    pub fn bad_request(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BadRequest, reason)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Renders the error as a complete plain-text response.
    pub fn to_response(&self) -> Response {
        let body = self
            .body
            .clone()
            .unwrap_or_else(|| self.reason.to_string());
        Response::error(self.status, self.reason.clone(), body.into_bytes())
    }
}
