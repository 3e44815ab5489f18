//! Shutdown coordination for the server.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};

use crate::apm::Agent;
use crate::lifecycle::signals::ShutdownSignal;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened during [`shutdown_gracefully`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownOutcome {
    /// The server stopped within the drain timeout.
    pub drained: bool,
    /// This call performed the agent shutdown.
    pub agent_flushed: bool,
}

/// Stop the listener, wait for in-flight requests, then shut the agent down.
///
/// The agent is shut down after the server task finishes, or after
/// `drain_timeout` if it does not, so no request is still recording when
/// the reporter flushes unless the timeout expired.
pub async fn shutdown_gracefully(
    shutdown: &Shutdown,
    mut server: JoinHandle<Result<(), std::io::Error>>,
    agent: &Agent,
    drain_timeout: Duration,
) -> ShutdownOutcome {
    tracing::info!("Shutting down server gracefully...");
    shutdown.trigger();

    let drained = match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(Ok(Ok(()))) => true,
        Ok(Ok(Err(e))) => {
            tracing::error!(error = %e, "HTTP server exited with error");
            true
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "HTTP server task failed");
            true
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = drain_timeout.as_secs_f64(),
                "In-flight requests did not drain in time, aborting"
            );
            server.abort();
            false
        }
    };

    let agent_flushed = agent.shutdown();

    ShutdownOutcome {
        drained,
        agent_flushed,
    }
}

/// The server stopped without a shutdown signal.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("HTTP server exited with error: {0}")]
    Server(#[from] std::io::Error),

    #[error("HTTP server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Serve until `signal` resolves, then shut down gracefully.
///
/// If `signal` fails the server keeps running without signal handling. If
/// the server task exits first the agent is still shut down, and any server
/// error is returned.
pub async fn run_until_signal<S>(
    shutdown: &Shutdown,
    mut server: JoinHandle<Result<(), std::io::Error>>,
    agent: &Agent,
    drain_timeout: Duration,
    signal: S,
) -> Result<ShutdownOutcome, ServeError>
where
    S: Future<Output = std::io::Result<ShutdownSignal>>,
{
    tokio::pin!(signal);
    let mut listening = true;

    loop {
        tokio::select! {
            received = &mut signal, if listening => match received {
                Ok(kind) => {
                    tracing::info!(signal = ?kind, "Shutdown signal received");
                    return Ok(shutdown_gracefully(shutdown, server, agent, drain_timeout).await);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Failed to listen for shutdown signals, serving until the server exits"
                    );
                    listening = false;
                }
            },
            result = &mut server => {
                let agent_flushed = agent.shutdown();
                match result {
                    Ok(Ok(())) => {
                        tracing::info!("HTTP server stopped without a signal");
                        return Ok(ShutdownOutcome {
                            drained: true,
                            agent_flushed,
                        });
                    }
                    Ok(Err(e)) => return Err(e.into()),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}
