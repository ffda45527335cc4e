//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use lantern::config::{Config, DispatchMode};
use lantern::server::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// A scratch document root, removed on drop.
pub struct TempRoot {
    path: PathBuf,
}

impl TempRoot {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!(
            "lantern-test-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `contents` at `relative`, creating parent directories.
    pub fn file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.path.join(relative);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// A response as a client sees it on the wire.
#[derive(Debug)]
pub struct RawResponse {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Splits wire bytes into status line, headers and body.
pub fn parse_raw_response(bytes: &[u8]) -> RawResponse {
    let end = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");

    let head: String = bytes[..end].iter().map(|&b| b as char).collect();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap().to_string();
    let status = parts.next().unwrap().parse().unwrap();
    let reason = parts.next().unwrap_or_default().to_string();

    let headers = lines
        .map(|line| {
            let (name, value) = line.split_once(": ").expect("header without separator");
            (name.to_string(), value.to_string())
        })
        .collect();

    RawResponse {
        version,
        status,
        reason,
        headers,
        body: bytes[end + 4..].to_vec(),
    }
}

pub fn test_config(root: &Path, dispatch: DispatchMode, workers: usize) -> Config {
    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.server.server_name = "LanternTest".to_string();
    cfg.server.dispatch = dispatch;
    cfg.server.workers = workers;
    cfg.static_files.document_root = root.to_path_buf();
    cfg
}

/// Starts a server on an ephemeral port and returns its address.
pub async fn spawn_server(cfg: Config) -> SocketAddr {
    let server = Server::bind(&cfg).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve_forever());
    addr
}

/// Sends `request` and reads until the server closes the connection.
pub async fn roundtrip(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}
