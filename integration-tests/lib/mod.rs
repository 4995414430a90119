//! Helpers for driving a real stats API server over TCP.
//!
//! Tests get a [`StatsFixture`] holding a throwaway statistics
//! directory, a server started on an ephemeral port, and a minimal
//! HTTP/1.1 client so the bytes on the wire are exactly what any
//! dashboard would see.

use std::net::SocketAddr;

use pool_stats_api::StatsApiServer;
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

/// Initialize tracing for a test. Safe to call from every test; only
/// the first call installs the subscriber.
pub fn start_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// A throwaway statistics directory laid out the way the pool engine
/// writes it.
pub struct StatsFixture {
    root: TempDir,
}

impl StatsFixture {
    /// Create the directory skeleton: `pool/` and `users/` under a
    /// fresh temporary root.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp stats dir");
        std::fs::create_dir(root.path().join("pool")).expect("Failed to create pool dir");
        std::fs::create_dir(root.path().join("users")).expect("Failed to create users dir");
        Self { root }
    }

    pub fn stats_dir(&self) -> &std::path::Path {
        self.root.path()
    }

    /// Write `pool/pool.status` with one record per line.
    pub fn write_pool_status(&self, records: &[&str]) {
        let mut contents = records.join("\n");
        contents.push('\n');
        std::fs::write(self.root.path().join("pool").join("pool.status"), contents)
            .expect("Failed to write pool status");
    }

    /// Write one user statistics file under `users/`.
    pub fn write_user(&self, name: &str, contents: impl AsRef<[u8]>) {
        std::fs::write(self.root.path().join("users").join(name), contents)
            .expect("Failed to write user file");
    }

    /// Remove the `pool/pool.status` file if present.
    pub fn remove_pool_status(&self) {
        let _ = std::fs::remove_file(self.root.path().join("pool").join("pool.status"));
    }
}

impl Default for StatsFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Start a stats API server on an ephemeral local port.
pub async fn start_stats_api(fixture: &StatsFixture) -> (StatsApiServer, SocketAddr) {
    let server = StatsApiServer::new(
        SocketAddr::from(([127, 0, 0, 1], 0)),
        fixture.stats_dir(),
    );
    let addr = server.start().await.expect("Failed to start stats API server");
    tracing::info!("Test stats API server listening on {addr}");
    (server, addr)
}

/// A parsed HTTP/1.1 response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).expect("Response body is not UTF-8")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }
}

/// Send a GET request and read the full response.
pub async fn http_get(addr: SocketAddr, path: &str) -> HttpResponse {
    http_request(addr, "GET", path).await
}

/// Send a request with an arbitrary method and read the full response.
///
/// Asks the server to close the connection so the body is simply
/// everything after the header block.
pub async fn http_request(addr: SocketAddr, method: &str, path: &str) -> HttpResponse {
    let mut stream = TcpStream::connect(addr)
        .await
        .expect("Failed to connect to stats API server");
    let request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("Failed to send request");

    let mut raw = Vec::new();
    stream
        .read_to_end(&mut raw)
        .await
        .expect("Failed to read response");
    parse_response(&raw)
}

fn parse_response(raw: &[u8]) -> HttpResponse {
    let split = raw
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .expect("Response has no header block");
    let head = std::str::from_utf8(&raw[..split]).expect("Response head is not UTF-8");
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().expect("Response has no status line");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("Status line has no status code");

    let headers = lines
        .filter_map(|line| {
            line.split_once(':')
                .map(|(key, value)| (key.to_string(), value.trim().to_string()))
        })
        .collect();

    HttpResponse {
        status,
        headers,
        body,
    }
}
