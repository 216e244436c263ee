//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use pinfeed::config::ProxyConfig;
use pinfeed::{HttpServer, Shutdown};

/// A canned upstream reply.
#[derive(Clone)]
pub struct MockReply {
    pub status: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl MockReply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK",
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn status(status: &'static str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        if !self.status.starts_with("304") {
            head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        head.push_str("Connection: close\r\n\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// Request heads received by a mock upstream, lowercased.
pub type Captured = Arc<Mutex<Vec<String>>>;

/// Start a mock upstream answering every request with `reply`.
pub async fn start_mock_upstream(reply: MockReply) -> (SocketAddr, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let seen = captured.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let reply = reply.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        seen.lock().unwrap().push(head.to_lowercase());
                        let _ = socket.write_all(&reply.to_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, captured)
}

/// Start an upstream that reads each request head and never answers.
pub async fn start_stalled_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_head(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });

    addr
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start the proxy against `origin`; returns its address and shutdown handle.
pub async fn start_proxy(origin: String, tweak: impl FnOnce(&mut ProxyConfig)) -> (SocketAddr, Shutdown) {
    let mut config = ProxyConfig::default();
    config.upstream.origin = origin;
    config.timeouts.connect_secs = 2;
    config.timeouts.request_secs = 5;
    tweak(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that neither follows redirects nor uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub const FEED_HEAD: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\"><channel><title>alice</title><link>https://www.pinterest.com/alice/</link><lastBuildDate>Sat, 05 Mar 2016 10:00:00 GMT</lastBuildDate>";
pub const FEED_TAIL: &str = "</channel></rss>";

/// A two-item feed: one channel-style and one board-style description.
pub fn sample_feed() -> String {
    format!(
        "{FEED_HEAD}{}{}{FEED_TAIL}",
        "<item><title>Cozy reading...</title><link>https://www.pinterest.com/pin/1/</link><description>&lt;p&gt;&lt;a href=\"https://www.pinterest.com/pin/1/\"&gt;&lt;img src=\"https://i.pinimg.com/236x/0a/1b/2c.jpg\"&gt;&lt;/a&gt;&lt;/p&gt;&lt;p&gt;Cozy reading nook under the stairs&lt;/p&gt;</description></item>",
        "<item><title>Lemon tart...</title><link>https://www.pinterest.com/pin/2/</link><description>&lt;a href=\"https://www.pinterest.com/pin/2/\"&gt;&lt;img src=\"https://i.pinimg.com/236x/3d/4e/5f.jpg\"&gt;&lt;/a&gt;Lemon tart with a torched meringue top</description></item>",
    )
}
