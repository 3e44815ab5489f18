//! traced-server
//!
//! A single-route HTTP server whose GET handler runs inside an APM
//! transaction with a nested segment around response generation.
//!
//! ```text
//!   Client ──▶ listener ──▶ middleware ──▶ handler
//!                                            │
//!                         transaction "HTTP_GET" (web)
//!                           └─ segment "ProcessRequest"
//!                                            │
//!                                            ▼
//!                                    apm reporter (log)
//!
//!   SIGINT/SIGTERM ──▶ stop listener ──▶ drain ──▶ agent shutdown ──▶ exit
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use traced_server::config::{load_config, ServerConfig};
use traced_server::lifecycle::{self, startup, Shutdown};
use traced_server::observability::logging;
use traced_server::{Agent, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "traced-server", version, about = "HTTP server with APM tracing")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = args.port {
        config.listener.bind_address = startup::override_port(&config.listener.bind_address, port)?;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("traced-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        app_name = %config.agent.app_name,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::start_metrics(&config.observability)?;
    let agent = Agent::from_config(&config.agent);
    let listener = startup::bind_listener(&config.listener).await?;

    let drain_timeout = Duration::from_secs(config.timeouts.drain_secs);
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, agent.clone());
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let outcome = lifecycle::run_until_signal(
        &shutdown,
        server_task,
        &agent,
        drain_timeout,
        lifecycle::wait_for_signal(),
    )
    .await?;
    tracing::info!(
        drained = outcome.drained,
        agent_flushed = outcome.agent_flushed,
        "Shutdown complete"
    );

    Ok(())
}
