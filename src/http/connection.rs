use std::io;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::time::timeout;

use crate::http::error::ProtocolError;
use crate::http::handler::{HandlerError, RequestHandler};
use crate::http::parser::{ParseError, is_disconnect, parse_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// Per-connection I/O deadlines. `None` waits forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadlines {
    /// Applied to every line read while parsing.
    pub read: Option<Duration>,
    /// Applied to the whole response write.
    pub write: Option<Duration>,
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A complete response was written.
    Responded { status: u16, bytes: usize },
    /// The connection was closed without a response.
    Dropped,
}

/// Drives a single connection: parse one request, answer it, close.
pub struct Connection<S> {
    reader: BufReader<S>,
    peer: String,
    handler: Arc<RequestHandler>,
    deadlines: Deadlines,
    state: ConnectionState,
    request_line: Option<(String, String)>,
    status: u16,
    started: Instant,
}

pub enum ConnectionState {
    Accepted,
    ParsingRequest,
    Handling(Request),
    Error(Failure),
    WritingResponse(ResponseWriter),
    Closed,
}

/// A failure that still gets an error response.
#[derive(Debug)]
pub enum Failure {
    Protocol(ProtocolError),
    Internal(HandlerError),
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        handler: Arc<RequestHandler>,
        deadlines: Deadlines,
    ) -> Self {
        Self {
            reader: BufReader::with_capacity(8192, stream),
            peer: peer.into(),
            handler,
            deadlines,
            state: ConnectionState::Accepted,
            request_line: None,
            status: 0,
            started: Instant::now(),
        }
    }

    /// Runs the connection to completion.
    ///
    /// Consumes the connection, so the stream is closed exactly once, when
    /// this returns.
    pub async fn run(mut self) -> Outcome {
        let mut outcome = Outcome::Dropped;

        loop {
            match mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Accepted => {
                    self.state = ConnectionState::ParsingRequest;
                }

                ConnectionState::ParsingRequest => {
                    self.state = self.read_request().await;
                }

                ConnectionState::Handling(req) => {
                    self.state = self.handle_request(req).await;
                }

                ConnectionState::Error(failure) => {
                    let response = match failure {
                        Failure::Protocol(e) => e.to_response(),
                        Failure::Internal(_) => Response::internal_error(),
                    };
                    self.state = self.start_writing(&response);
                }

                ConnectionState::WritingResponse(mut writer) => {
                    outcome = self.write_response(&mut writer).await;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        outcome
    }

    async fn read_request(&mut self) -> ConnectionState {
        match parse_request(&mut self.reader, self.deadlines.read).await {
            Ok(req) => {
                tracing::debug!(
                    peer = %self.peer,
                    method = %req.method,
                    target = %req.target,
                    "Parsed request"
                );
                ConnectionState::Handling(req)
            }

            Err(ParseError::Protocol(e)) => {
                tracing::warn!(peer = %self.peer, error = %e, "Rejected request");
                ConnectionState::Error(Failure::Protocol(e))
            }

            Err(e) if e.is_disconnect() => {
                tracing::info!(peer = %self.peer, error = %e, "Client went away");
                ConnectionState::Closed
            }

            Err(ParseError::TimedOut) => {
                tracing::warn!(peer = %self.peer, "Read deadline expired, closing");
                ConnectionState::Closed
            }

            Err(e) => {
                tracing::error!(peer = %self.peer, error = %e, "Failed to read request");
                ConnectionState::Closed
            }
        }
    }

    /// Runs the handler on its own task so a panic in it still gets a 500.
    async fn handle_request(&mut self, req: Request) -> ConnectionState {
        self.request_line = Some((req.method.to_string(), req.target.clone()));

        let handler = Arc::clone(&self.handler);
        let handled = tokio::spawn(async move { handler.handle(&req).await })
            .await
            .map_err(HandlerError::from)
            .and_then(|result| result);

        match handled {
            Ok(response) => self.start_writing(&response),
            Err(e) => {
                let (method, target) = self
                    .request_line
                    .as_ref()
                    .map_or(("-", "-"), |(m, t)| (m.as_str(), t.as_str()));
                tracing::error!(
                    peer = %self.peer,
                    method,
                    target,
                    error = %e,
                    "Request handling failed"
                );
                ConnectionState::Error(Failure::Internal(e))
            }
        }
    }

    fn start_writing(&mut self, response: &Response) -> ConnectionState {
        self.status = response.status.as_u16();
        ConnectionState::WritingResponse(ResponseWriter::new(response))
    }

    async fn write_response(&mut self, writer: &mut ResponseWriter) -> Outcome {
        let stream = self.reader.get_mut();

        let result = match self.deadlines.write {
            Some(limit) => timeout(limit, writer.write_to_stream(stream))
                .await
                .unwrap_or_else(|_| {
                    Err(io::Error::new(io::ErrorKind::TimedOut, "write deadline expired"))
                }),
            None => writer.write_to_stream(stream).await,
        };

        let (method, target) = self
            .request_line
            .as_ref()
            .map_or(("-", "-"), |(m, t)| (m.as_str(), t.as_str()));

        match result {
            Ok(()) => {
                tracing::info!(
                    peer = %self.peer,
                    method,
                    target,
                    status = self.status,
                    bytes = writer.len(),
                    elapsed_ms = self.started.elapsed().as_millis() as u64,
                    "Served request"
                );
                Outcome::Responded {
                    status: self.status,
                    bytes: writer.len(),
                }
            }
            Err(e) if is_disconnect(&e) => {
                tracing::info!(peer = %self.peer, method, target, error = %e, "Client went away during write");
                Outcome::Dropped
            }
            Err(e) => {
                tracing::error!(
                    peer = %self.peer,
                    method,
                    target,
                    written = writer.written(),
                    error = %e,
                    "Failed to write response"
                );
                Outcome::Dropped
            }
        }
    }
}
