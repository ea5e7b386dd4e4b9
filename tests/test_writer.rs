mod common;

use std::pin::Pin;
use std::task::{Context, Poll};

use common::Site;
use lantern::http::request::{Method, RequestBuilder};
use lantern::http::response::{Response, ResponseBuilder, StatusCode};
use lantern::http::writer::{ResponseWriter, serialize_response};
use tokio::io::{AsyncReadExt, AsyncWrite};

/// A generic HTTP/1.1 response reader, independent of the server's types.
struct Parsed {
    status: u16,
    reason: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

fn parse_response(raw: &[u8]) -> Parsed {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let mut parts = status_line.splitn(3, ' ');
    assert_eq!(parts.next(), Some("HTTP/1.1"));
    let status = parts.next().unwrap().parse().unwrap();
    let reason = parts.next().unwrap_or("").to_string();

    let headers = lines
        .map(|line| {
            let (k, v) = line.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();

    Parsed {
        status,
        reason,
        headers,
        body,
    }
}

fn assert_round_trip(response: &Response) {
    let parsed = parse_response(&serialize_response(response));

    assert_eq!(parsed.status, response.status.as_u16());
    assert_eq!(parsed.reason, response.reason);
    let expected: Vec<(String, String)> = response
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(parsed.headers, expected);
    assert_eq!(parsed.body, response.body.clone().unwrap_or_default());
}

#[test]
fn test_serialize_exact_bytes() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .body(b"hi".to_vec())
        .build();

    assert_eq!(
        serialize_response(&response),
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nhi".to_vec()
    );
}

#[test]
fn test_serialize_without_body_ends_at_blank_line() {
    let response = ResponseBuilder::new(StatusCode::NotFound)
        .reason("File not found")
        .build();

    let bytes = serialize_response(&response);
    assert!(bytes.starts_with(b"HTTP/1.1 404 File not found\r\n"));
    assert!(bytes.ends_with(b"Content-Length: 0\r\n\r\n"));
}

#[test]
fn test_serialize_keeps_duplicate_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .append_header("Set-Cookie", "a=1")
        .append_header("Set-Cookie", "b=2")
        .build();

    let text = String::from_utf8(serialize_response(&response)).unwrap();
    assert!(text.contains("Set-Cookie: a=1\r\nSet-Cookie: b=2\r\n"));
}

#[test]
fn test_serialize_body_is_verbatim_binary() {
    let body = vec![0u8, 0xff, b'\r', b'\n', 0x80];
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();

    assert!(serialize_response(&response).ends_with(&body));
}

#[test]
fn test_serialize_header_text_as_latin1() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("X-Name", "caf\u{e9} \u{2603}")
        .build();

    let bytes = serialize_response(&response);
    let needle = b"X-Name: caf\xe9 ?\r\n";
    assert!(bytes.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn test_round_trip_builder_responses() {
    assert_round_trip(
        &ResponseBuilder::standard(StatusCode::Ok)
            .header("Content-Type", "text/html")
            .body(b"<h1>hello</h1>".to_vec())
            .build(),
    );
    assert_round_trip(
        &ResponseBuilder::standard(StatusCode::MethodNotAllowed)
            .reason("Method not allowed")
            .build(),
    );
    assert_round_trip(&Response::internal_error());
}

#[tokio::test]
async fn test_round_trip_handler_responses() {
    let site = Site::new();
    let handler = site.handler();

    let cases = [
        (Method::GET, "/hello.txt", 200),
        (Method::HEAD, "/hello.txt", 200),
        (Method::GET, "/files/", 200),
        (Method::GET, "/missing.txt", 404),
        (Method::DELETE, "/hello.txt", 405),
    ];

    for (method, target, status) in cases {
        let request = RequestBuilder::new()
            .method(method)
            .target(target)
            .header("Host", "localhost")
            .build()
            .unwrap();
        let response = handler.handle(&request).await.unwrap();

        assert_eq!(response.status.as_u16(), status, "{target}");
        assert_round_trip(&response);
    }
}

#[tokio::test]
async fn test_write_to_stream_writes_everything_and_closes() {
    let response = ResponseBuilder::standard(StatusCode::Ok)
        .body(vec![b'x'; 100_000])
        .build();
    let expected = serialize_response(&response);

    let (mut client, mut server) = tokio::io::duplex(1024);
    let reader = tokio::spawn(async move {
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();
        buf
    });

    let mut writer = ResponseWriter::new(&response);
    writer.write_to_stream(&mut server).await.unwrap();
    assert_eq!(writer.written(), writer.len());

    // read_to_end only returns once the write side has been shut down
    let received = reader.await.unwrap();
    assert_eq!(received, expected);
}

/// A sink that accepts nothing and records whether it was shut down.
#[derive(Default)]
struct ClosedSink {
    shut_down: bool,
}

impl AsyncWrite for ClosedSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Ready(Ok(0))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.shut_down = true;
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_write_failure_still_shuts_down() {
    let response = ResponseBuilder::new(StatusCode::Ok).body(b"data".to_vec()).build();
    let mut sink = ClosedSink::default();

    let err = ResponseWriter::new(&response)
        .write_to_stream(&mut sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::WriteZero);
    assert!(sink.shut_down);
}
