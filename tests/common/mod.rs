//! Minimal HTTP/1.1 responder for exercising the real prober against localhost

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use gibs_layer_validator_lib::infrastructure::http_client::{HttpClient, HttpClientConfig};

/// How the server answers one request
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    /// 302 to the given path on the same server
    Redirect(String),
    /// Accept the request and never answer
    Hang,
}

type Route = dyn Fn(&str) -> Reply + Send + Sync;

pub struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Starts a server on an ephemeral port; `route` maps request targets to replies
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Route> = Arc::new(route);

        let seen = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let route = Arc::clone(&route);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let _ = handle_connection(stream, route, seen).await;
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request targets received so far, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    route: Arc<Route>,
    seen: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..read]);
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    seen.lock().unwrap().push(target.clone());

    let response = match route(&target) {
        Reply::Status(204) => "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n".to_string(),
        Reply::Status(code) => {
            format!("HTTP/1.1 {code} X\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
        }
        Reply::Redirect(location) => format!(
            "HTTP/1.1 302 Found\r\nlocation: {location}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        ),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return Ok(());
        }
    };

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Address nothing is listening on
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Client that bypasses any system proxy
pub fn local_client(timeout: Duration) -> HttpClient {
    HttpClient::new(HttpClientConfig {
        timeout,
        use_system_proxy: false,
        ..HttpClientConfig::default()
    })
    .unwrap()
}

/// Writes a pattern table whose `DEFAULT` entry points at `base_url`
pub fn write_pattern_table(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("api.json");
    let table = serde_json::json!({
        "layerTypes": {
            "DEFAULT": {
                "baseUrl": base_url,
                "pathTemplate": "{layer}/default/{time}/GoogleMapsCompatible_Level7/{z}/{y}/{x}.png",
                "maxZoom": 7
            }
        }
    });
    std::fs::write(&path, serde_json::to_string_pretty(&table).unwrap()).unwrap();
    path
}

/// Writes a layer catalog
pub fn write_catalog(dir: &Path, layers: &[&str]) -> PathBuf {
    let path = dir.join("layers.json");
    std::fs::write(&path, serde_json::to_string(layers).unwrap()).unwrap();
    path
}
