//! Local HTTP servers for adapter tests.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serve a single response on a random local port and return its base URL.
pub async fn serve_once(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        write_response(&mut socket, status, body).await;
    });

    format!("http://{addr}")
}

/// A canned response for one method and request target.
///
/// A target with a query string must match exactly; a target without one
/// matches any query on that path.
#[derive(Debug, Clone)]
pub struct Route {
    method: &'static str,
    target: String,
    status: u16,
    body: String,
}

pub fn route(
    method: &'static str,
    target: impl Into<String>,
    status: u16,
    body: impl Into<String>,
) -> Route {
    Route {
        method,
        target: target.into(),
        status,
        body: body.into(),
    }
}

/// A request received by [`MockServer`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query, as sent on the request line.
    pub target: String,
    headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }
}

/// Routed HTTP server that records every request it answers.
///
/// Unrouted requests get a 404 with a vCenter-style error body.
pub struct MockServer {
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                tokio::spawn(async move { handle(socket, &routes, &seen).await });
            }
        });

        Self {
            base: format!("http://{addr}"),
            requests,
        }
    }

    pub fn url(&self) -> &str {
        &self.base
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    /// Request targets in arrival order, e.g. `GET /api/session`.
    pub fn targets(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.target))
            .collect()
    }
}

async fn handle(mut socket: TcpStream, routes: &[Route], seen: &Mutex<Vec<Recorded>>) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };

    let matched = routes
        .iter()
        .find(|r| r.method == request.method && r.target == request.target)
        .or_else(|| {
            routes.iter().find(|r| {
                r.method == request.method && !r.target.contains('?') && r.target == request.path()
            })
        });
    let (status, body) = match matched {
        Some(route) => (route.status, route.body.clone()),
        None => (
            404,
            r#"{"error_type":"NOT_FOUND","messages":[{"id":"mock","default_message":"no route"}]}"#
                .to_string(),
        ),
    };

    seen.lock().push(request);
    write_response(&mut socket, status, &body).await;
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(Recorded {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&buf[head_end..]).to_string(),
    })
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &str) {
    let reason = if (200..300).contains(&status) { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await.ok();
    socket.shutdown().await.ok();
}
