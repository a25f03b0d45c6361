//! In-process HTTP backend for integration tests
//!
//! Speaks just enough HTTP/1.1 for reqwest: one request per connection,
//! `Connection: close` on every response. Routes are keyed by method and
//! path; each holds a queue of canned responses whose last entry repeats.
//! Every request is recorded before its response is released, so a test
//! can observe a request that is still held open by a gate.

#![allow(dead_code)]

use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: Option<&'static str>,
    gate: Option<Arc<Notify>>,
}

impl MockResponse {
    pub fn json(status: u16, body: JsonValue) -> Self {
        MockResponse {
            status,
            body: body.to_string(),
            content_type: Some("application/json"),
            gate: None,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        MockResponse {
            status,
            body: body.to_string(),
            content_type: Some("text/plain"),
            gate: None,
        }
    }

    pub fn empty(status: u16) -> Self {
        MockResponse {
            status,
            body: String::new(),
            content_type: None,
            gate: None,
        }
    }

    /// Hold the response until `gate.notify_one()`
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Lower-cased header names
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> JsonValue {
        serde_json::from_str(&self.body).unwrap_or(JsonValue::Null)
    }
}

type Routes = Arc<Mutex<HashMap<(String, String), VecDeque<MockResponse>>>>;

pub struct MockBackend {
    addr: SocketAddr,
    routes: Routes,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let routes = routes.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let routes = routes.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let _ = serve(stream, routes, requests).await;
                    });
                }
            })
        };

        MockBackend {
            addr,
            routes,
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Queue a response for `METHOD /api{path}`
    pub fn on(&self, method: &str, path: &str, response: MockResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_ascii_uppercase(), format!("/api{}", path)))
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        let full = format!("/api{}", path);
        self.requests().into_iter().filter(|r| r.path == full).collect()
    }

    /// Wait until `count` requests to `path` have arrived
    pub async fn wait_for(&self, path: &str, count: usize) {
        for _ in 0..200 {
            if self.requests_to(path).len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {} request(s) to {}", count, path);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: Routes,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) -> std::io::Result<()> {
    let request = match read_request(&mut stream).await? {
        Some(r) => r,
        None => return Ok(()),
    };

    let route_path = request.path.split('?').next().unwrap_or("").to_string();
    let queued = {
        let mut routes = routes.lock().unwrap();
        let next = match routes.get_mut(&(request.method.clone(), route_path)) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        next
    };
    let response =
        queued.unwrap_or_else(|| MockResponse::json(404, serde_json::json!({ "message": "not found" })));

    requests.lock().unwrap().push(request);

    if let Some(gate) = &response.gate {
        gate.notified().await;
    }

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    if let Some(content_type) = response.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(response.body.as_bytes()).await?;
    stream.shutdown().await
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<RecordedRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    }))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
