//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

use traced_server::apm::{Agent, MemoryReporter};
use traced_server::config::ServerConfig;
use traced_server::lifecycle::{startup, Shutdown};
use traced_server::HttpServer;

/// A running server on an ephemeral port with an in-memory reporter.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub agent: Agent,
    pub reporter: Arc<MemoryReporter>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a server bound to 127.0.0.1 on a free port.
pub async fn start_server() -> TestServer {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();

    let reporter = Arc::new(MemoryReporter::new());
    let agent = Agent::new("integration", reporter.clone());

    let listener = startup::bind_listener(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, agent.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        agent,
        reporter,
        shutdown,
        handle,
    }
}

/// HTTP client without connection pooling or proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
