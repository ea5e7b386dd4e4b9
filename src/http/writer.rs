use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response into its exact wire form.
///
/// Status line and headers are encoded as ISO-8859-1; characters outside
/// that range are replaced with `?`.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + resp.body_len());

    let status_line = format!("{HTTP_VERSION} {} {}\r\n", resp.status.as_u16(), resp.reason);
    push_latin1(&mut buf, &status_line);

    for (k, v) in resp.headers.iter() {
        push_latin1(&mut buf, k);
        buf.extend_from_slice(b": ");
        push_latin1(&mut buf, v);
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");

    if let Some(body) = &resp.body {
        buf.extend_from_slice(body);
    }

    buf
}

fn push_latin1(buf: &mut Vec<u8>, s: &str) {
    buf.extend(s.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')));
}

/// Writes one serialized response and closes the write side.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    /// Total size of the serialized response.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes handed to the stream so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Writes the whole response, then flushes and shuts down the stream's
    /// write side. The flush and shutdown run even when the write fails.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let written = self.write_all(stream).await;
        let flushed = stream.flush().await;
        if let Err(e) = stream.shutdown().await {
            tracing::debug!(error = %e, "Shutdown after response failed");
        }

        written?;
        flushed
    }

    async fn write_all<W>(&mut self, stream: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed while writing",
                ));
            }

            self.written += n;
        }

        Ok(())
    }
}
