//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use mock_redirect_proxy::config::ProxyConfig;
use mock_redirect_proxy::http::HttpServer;
use mock_redirect_proxy::intercept::InterceptorChain;
use mock_redirect_proxy::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A running proxy under test.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    #[allow(dead_code)]
    pub config_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl TestProxy {
    /// Client that sends every plain-HTTP request through this proxy.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .proxy(reqwest::Proxy::http(format!("http://{}", self.addr)).unwrap())
            .pool_max_idle_per_host(0)
            .build()
            .unwrap()
    }
}

/// Start a proxy with interceptors built from `config`.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let chain = InterceptorChain::from_config(&config).unwrap();
    start_proxy_with(config, chain).await
}

/// Start a proxy with an explicit interceptor chain.
pub async fn start_proxy_with(config: ProxyConfig, chain: InterceptorChain) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::with_interceptors(config, chain).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestProxy {
        addr,
        shutdown,
        config_tx,
    }
}

/// Config redirecting the default path pattern to a plain-HTTP mock on `mock`.
pub fn redirect_config(mock: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.mock_redirect.target_host = Some(mock.ip().to_string());
    config.mock_redirect.target_scheme = "http".into();
    config.mock_redirect.target_port = mock.port();
    config
}

/// Start a backend that answers every request with `body` and reports each
/// request head (request line and headers) on the returned channel.
pub async fn start_mock_backend(body: &'static str) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (head_tx, head_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let head_tx = head_tx.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let _ = head_tx.send(head);

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, head_rx)
}

/// Start a backend that accepts connections and reads requests but never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut sink = Vec::new();
                let _ = socket.read_to_end(&mut sink).await;
            });
        }
    });

    addr
}

/// Start a TCP server that echoes back whatever it receives.
#[allow(dead_code)]
pub async fn start_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    addr
}

/// Read from `socket` until the end of an HTTP head.
pub async fn read_head<S: AsyncReadExt + Unpin>(socket: &mut S) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
