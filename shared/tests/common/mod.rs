//! Fake upstream image host for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image_relay_shared::config::ProxyConfig;
use image_relay_shared::AppState;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the fake upstream sends back for a path.
#[derive(Clone)]
#[allow(dead_code)]
pub enum Reply {
    Image {
        content_type: Option<&'static str>,
        bytes: Vec<u8>,
    },
    Status(u16, String),
    /// Error status advertising `len` body bytes, streamed until the client hangs up
    StatusStream { code: u16, len: usize },
    Redirect(String),
    Stall(Duration),
}

/// A request as seen by the fake upstream.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub path: String,
    pub headers: HashMap<String, String>,
}

pub struct FakeUpstream {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    body_bytes_sent: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    /// Body bytes the client accepted from streamed replies
    pub fn body_bytes_sent(&self) -> usize {
        self.body_bytes_sent.load(Ordering::SeqCst)
    }
}

/// Start a fake upstream on an ephemeral port. `route` picks the reply for each request path.
pub async fn start_upstream<F>(route: F) -> FakeUpstream
where
    F: Fn(&str) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let body_bytes_sent = Arc::new(AtomicUsize::new(0));
    let route = Arc::new(route);

    let log = Arc::clone(&recorded);
    let sent = Arc::clone(&body_bytes_sent);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let route = Arc::clone(&route);
            let log = Arc::clone(&log);
            let sent = Arc::clone(&sent);
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let reply = route(&request.path);
                log.lock().unwrap().push(request);

                let response = match reply {
                    Reply::Image { content_type, bytes } => {
                        let mut head = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n",
                            bytes.len()
                        );
                        if let Some(ct) = content_type {
                            head.push_str(&format!("Content-Type: {}\r\n", ct));
                        }
                        head.push_str("\r\n");
                        let mut out = head.into_bytes();
                        out.extend_from_slice(&bytes);
                        out
                    }
                    Reply::Status(code, body) => format!(
                        "HTTP/1.1 {} Fake\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        code,
                        body.len(),
                        body
                    )
                    .into_bytes(),
                    Reply::StatusStream { code, len } => {
                        let head = format!(
                            "HTTP/1.1 {} Fake\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            code, len
                        );
                        if socket.write_all(head.as_bytes()).await.is_err() {
                            return;
                        }
                        let chunk = vec![b'e'; 64 * 1024];
                        let mut remaining = len;
                        while remaining > 0 {
                            let n = remaining.min(chunk.len());
                            if socket.write_all(&chunk[..n]).await.is_err() {
                                return;
                            }
                            sent.fetch_add(n, Ordering::SeqCst);
                            remaining -= n;
                        }
                        let _ = socket.shutdown().await;
                        return;
                    }
                    Reply::Redirect(location) => format!(
                        "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        location
                    )
                    .into_bytes(),
                    Reply::Stall(delay) => {
                        tokio::time::sleep(delay).await;
                        return;
                    }
                };

                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    FakeUpstream { addr, recorded, body_bytes_sent }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    Some(Recorded { path, headers })
}

/// Proxy state that only allows the loopback fake upstream
pub fn local_state(config: ProxyConfig) -> Arc<AppState> {
    AppState::new(config.with_allowed_hosts(["127.0.0.1"])).unwrap()
}
