//! Connection lifecycle over in-memory streams.

mod common;

use common::{TempRoot, parse_raw_response};
use lantern::http::connection::{Connection, ConnectionSettings, ReadError};
use lantern::http::parser::ParseError;
use lantern::static_files::StaticFiles;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

fn setup(root: &TempRoot, settings: ConnectionSettings) -> (DuplexStream, Connection<DuplexStream>) {
    let files = Arc::new(StaticFiles::new(root.path(), "LanternTest").unwrap());
    let (client, server) = tokio::io::duplex(64 * 1024);
    (client, Connection::new(server, files, settings))
}

#[tokio::test]
async fn test_serves_request_delivered_one_byte_at_a_time() {
    let root = TempRoot::new();
    root.file("hello.txt", b"hello world");
    let (mut client, conn) = setup(&root, ConnectionSettings::default());

    let server = tokio::spawn(conn.run());

    for byte in b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n" {
        client.write_all(&[*byte]).await.unwrap();
        tokio::task::yield_now().await;
    }

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    server.await.unwrap().unwrap();

    let parsed = parse_raw_response(&response);
    assert_eq!(parsed.status, 200);
    assert_eq!(parsed.body, b"hello world");
    assert_eq!(parsed.headers["Content-Length"], "11");
    assert_eq!(parsed.headers["Content-Type"], "text/plain");
}

#[tokio::test]
async fn test_head_response_has_no_body() {
    let root = TempRoot::new();
    root.file("index.html", b"<p>hi</p>");
    let (mut client, conn) = setup(&root, ConnectionSettings::default());
    let server = tokio::spawn(conn.run());

    client.write_all(b"HEAD / HTTP/1.1\r\n\r\n").await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    server.await.unwrap().unwrap();

    let parsed = parse_raw_response(&response);
    assert_eq!(parsed.status, 200);
    assert_eq!(parsed.headers["Content-Length"], "9");
    assert!(parsed.body.is_empty());
}

#[tokio::test]
async fn test_malformed_request_line_gets_400() {
    let root = TempRoot::new();
    let (mut client, conn) = setup(&root, ConnectionSettings::default());
    let server = tokio::spawn(conn.run());

    client.write_all(b"GET / HTTP/1.1 extra\r\n\r\n").await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    server.await.unwrap().unwrap();

    let parsed = parse_raw_response(&response);
    assert_eq!(parsed.status, 400);
    assert_eq!(parsed.body, b"Bad Request");
}

#[tokio::test]
async fn test_unknown_method_gets_405() {
    let root = TempRoot::new();
    root.file("index.html", b"x");
    let (mut client, conn) = setup(&root, ConnectionSettings::default());
    let server = tokio::spawn(conn.run());

    client.write_all(b"POST / HTTP/1.1\r\n\r\n").await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    server.await.unwrap().unwrap();

    let parsed = parse_raw_response(&response);
    assert_eq!(parsed.status, 405);
    assert!(parsed.body.is_empty());
}

#[tokio::test]
async fn test_oversized_headers_get_431() {
    let root = TempRoot::new();
    let settings = ConnectionSettings {
        max_header_bytes: 128,
        ..ConnectionSettings::default()
    };
    let (mut client, conn) = setup(&root, settings);
    let server = tokio::spawn(conn.run());

    let mut request = b"GET / HTTP/1.1\r\nX-Padding: ".to_vec();
    request.extend(std::iter::repeat_n(b'a', 512));
    client.write_all(&request).await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    server.await.unwrap().unwrap();

    assert_eq!(parse_raw_response(&response).status, 431);
}

#[tokio::test]
async fn test_headers_past_bound_in_one_read_get_431() {
    let root = TempRoot::new();
    root.file("index.html", b"x");
    let settings = ConnectionSettings {
        max_header_bytes: 5000,
        ..ConnectionSettings::default()
    };
    let (mut client, mut conn) = setup(&root, settings);

    let mut request = b"GET / HTTP/1.1\r\nX-Padding: ".to_vec();
    request.extend(std::iter::repeat_n(b'a', 7000));
    request.extend_from_slice(b"\r\n\r\n");
    client.write_all(&request).await.unwrap();

    let result = conn.read_request().await;
    assert!(matches!(
        result,
        Err(ReadError::Parse(ParseError::HeadersTooLarge))
    ));
}

#[tokio::test]
async fn test_complete_oversized_head_gets_431() {
    let root = TempRoot::new();
    root.file("index.html", b"x");
    let settings = ConnectionSettings {
        max_header_bytes: 5000,
        ..ConnectionSettings::default()
    };
    let (mut client, conn) = setup(&root, settings);
    let server = tokio::spawn(conn.run());

    let mut request = b"GET / HTTP/1.1\r\nX-Padding: ".to_vec();
    request.extend(std::iter::repeat_n(b'a', 7000));
    request.extend_from_slice(b"\r\n\r\n");
    client.write_all(&request).await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    server.await.unwrap().unwrap();

    assert_eq!(parse_raw_response(&response).status, 431);
}

/// Fails every read and records everything written to it.
struct BrokenReader {
    written: Arc<Mutex<Vec<u8>>>,
}

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("disk unplugged")))
    }
}

impl AsyncWrite for BrokenReader {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_read_failure_gets_500_with_error_as_reason() {
    let root = TempRoot::new();
    let files = Arc::new(StaticFiles::new(root.path(), "LanternTest").unwrap());
    let written = Arc::new(Mutex::new(Vec::new()));
    let stream = BrokenReader {
        written: written.clone(),
    };

    Connection::new(stream, files, ConnectionSettings::default())
        .run()
        .await
        .unwrap();

    let response = written.lock().unwrap().clone();
    let parsed = parse_raw_response(&response);
    assert_eq!(parsed.status, 500);
    assert_eq!(parsed.reason, "disk unplugged");
    assert_eq!(parsed.body, b"Internal Server Error");
    assert_eq!(parsed.headers["Content-Length"], "21");
}

#[tokio::test]
async fn test_peer_closing_early_gets_no_response() {
    let root = TempRoot::new();
    let (mut client, mut conn) = setup(&root, ConnectionSettings::default());

    client.write_all(b"GET / HTTP/1.1\r\nHost").await.unwrap();
    client.shutdown().await.unwrap();

    let result = conn.read_request().await;
    assert!(matches!(result, Err(ReadError::Reset)));
}

#[tokio::test]
async fn test_reset_closes_without_writing() {
    let root = TempRoot::new();
    let (client, conn) = setup(&root, ConnectionSettings::default());

    drop(client);

    // Nothing to read, nobody to answer; finishes cleanly.
    conn.run().await.unwrap();
}

#[tokio::test]
async fn test_read_timeout_closes_silently() {
    let root = TempRoot::new();
    let settings = ConnectionSettings {
        read_timeout: Duration::from_millis(50),
        ..ConnectionSettings::default()
    };
    let (mut client, conn) = setup(&root, settings);
    let server = tokio::spawn(conn.run());

    client.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    server.await.unwrap().unwrap();

    assert!(response.is_empty());
}

#[tokio::test]
async fn test_read_request_reports_parse_errors() {
    let root = TempRoot::new();
    let (mut client, mut conn) = setup(&root, ConnectionSettings::default());

    client.write_all(b"BROKEN\r\n\r\n").await.unwrap();

    let result = conn.read_request().await;
    assert!(matches!(
        result,
        Err(ReadError::Parse(ParseError::MalformedRequest(_)))
    ));
}
