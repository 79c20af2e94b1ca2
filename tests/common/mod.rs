//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use trie_router::config::{parse_config, RouterConfig};
use trie_router::http::HttpServer;
use trie_router::lifecycle::Shutdown;

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<RouterConfig>,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Parse a configuration written inline in a test.
pub fn config(toml: &str) -> RouterConfig {
    parse_config(toml).expect("test config should be valid")
}

/// Start a server for `config` on 127.0.0.1 with an OS-assigned port.
pub async fn start_server(config: RouterConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, update_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).expect("routes should compile");
    let server_shutdown = shutdown.subscribe();

    let handle =
        tokio::spawn(async move { server.run(listener, update_rx, server_shutdown).await });

    TestServer {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

/// Client that neither follows redirects nor reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}
