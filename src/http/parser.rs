use std::io;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::time::timeout;

use crate::http::error::ProtocolError;
use crate::http::headers::Headers;
use crate::http::request::{Method, Request};

/// Longest accepted request or header line, terminator included.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Most header lines accepted before the blank line.
pub const MAX_HEADERS: usize = 100;

const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    #[error("timed out waiting for request data")]
    TimedOut,
    #[error("connection closed before a request line was received")]
    Closed,
}

impl ParseError {
    /// True when the peer went away and answering would be pointless.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ParseError::Io(e) => is_disconnect(e),
            ParseError::Closed => true,
            _ => false,
        }
    }
}

/// Whether an I/O error means the peer reset or abandoned the connection.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

/// Reads one request (request line plus header block) from `reader`.
///
/// Every line read is bounded by `read_timeout` when one is given. Nothing
/// past the blank line is consumed from the stream; bytes the reader had
/// already buffered end up in [`Request::pending`].
pub async fn parse_request<R>(
    reader: &mut BufReader<R>,
    read_timeout: Option<Duration>,
) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::with_capacity(256);

    let n = read_line(reader, &mut line, read_timeout).await?;
    if n == 0 {
        return Err(ParseError::Closed);
    }
    if n > MAX_LINE_LENGTH {
        return Err(ProtocolError::bad_request("Request line is too long").into());
    }

    let (method, target, version) = parse_request_line(&line)?;

    let mut raw_headers: Vec<Vec<u8>> = Vec::new();
    loop {
        let n = read_line(reader, &mut line, read_timeout).await?;
        if n > MAX_LINE_LENGTH {
            return Err(ProtocolError::bad_request("Header line is too long").into());
        }
        if is_blank(&line) {
            break;
        }

        raw_headers.push(line.clone());
        if raw_headers.len() > MAX_HEADERS {
            return Err(ProtocolError::bad_request("Too many headers").into());
        }
    }

    let request = Request {
        method,
        target,
        version,
        headers: parse_headers(&raw_headers),
        pending: Bytes::copy_from_slice(reader.buffer()),
    };

    if request.host().is_none() {
        return Err(ProtocolError::bad_request("Bad request")
            .with_body("Host header is required")
            .into());
    }

    Ok(request)
}

/// Splits a raw request line into method, target and version.
fn parse_request_line(raw: &[u8]) -> Result<(Method, String, String), ProtocolError> {
    let line = latin1(raw);
    let line = line.trim_end_matches(['\r', '\n']);

    let words: Vec<&str> = line.split_ascii_whitespace().collect();
    let &[method, target, version] = words.as_slice() else {
        return Err(ProtocolError::bad_request("Malformed request line"));
    };

    if version != HTTP_VERSION {
        return Err(ProtocolError::bad_request("Unexpected HTTP version"));
    }

    Ok((Method::parse(method), target.to_string(), version.to_string()))
}

/// Parses `Name: value` lines. Continuation lines are folded into the
/// previous value; lines without a colon are dropped.
fn parse_headers(lines: &[Vec<u8>]) -> Headers {
    let mut headers = Headers::new();

    for raw in lines {
        let line = latin1(raw);
        let line = line.trim_end_matches(['\r', '\n']);

        if line.starts_with([' ', '\t']) {
            if let Some(value) = headers.last_value_mut() {
                let folded = line.trim();
                if !folded.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(folded);
                }
                continue;
            }
        }

        match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                headers.append(name.trim(), value.trim());
            }
            _ => tracing::debug!(line = %line, "Ignoring malformed header line"),
        }
    }

    headers
}

/// Reads up to and including the next `\n`, never buffering more than
/// `MAX_LINE_LENGTH + 1` bytes. Returns the number of bytes read.
async fn read_line<R>(
    reader: &mut BufReader<R>,
    buf: &mut Vec<u8>,
    read_timeout: Option<Duration>,
) -> Result<usize, ParseError>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    let mut limited = (&mut *reader).take(MAX_LINE_LENGTH as u64 + 1);
    let read = limited.read_until(b'\n', buf);

    let n = match read_timeout {
        Some(limit) => timeout(limit, read)
            .await
            .map_err(|_| ParseError::TimedOut)??,
        None => read.await?,
    };
    Ok(n)
}

fn is_blank(line: &[u8]) -> bool {
    matches!(line, b"" | b"\n" | b"\r\n")
}

/// Decodes ISO-8859-1: every byte maps to the code point of the same value.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
