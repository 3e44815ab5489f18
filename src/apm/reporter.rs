//! Destinations for finished transaction records.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::apm::record::TransactionRecord;

/// Receives finished transactions from the agent.
///
/// `report` is called from request handlers, possibly concurrently and
/// possibly while a handler is unwinding, so implementations must not panic.
pub trait Reporter: Send + Sync + 'static {
    /// Accept one finished transaction.
    fn report(&self, record: TransactionRecord);

    /// Flush anything buffered and release resources.
    ///
    /// The agent calls this at most once.
    fn shutdown(&self) {}
}

/// Emits each finished transaction as a structured log event.
#[derive(Debug, Clone)]
pub struct LogReporter {
    app_name: String,
}

impl LogReporter {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Reporter for LogReporter {
    fn report(&self, record: TransactionRecord) {
        let attributes = serde_json::to_string(&record.attributes).unwrap_or_default();

        tracing::info!(
            target: "apm",
            app = %self.app_name,
            transaction = %record.name,
            category = %record.category,
            duration_ms = record.duration.as_secs_f64() * 1000.0,
            segments = record.segments.len(),
            attributes = %attributes,
            error = record.error.as_deref(),
            "Transaction finished"
        );

        if tracing::enabled!(target: "apm", tracing::Level::DEBUG) {
            match serde_json::to_string(&record) {
                Ok(json) => tracing::debug!(target: "apm", record = %json, "Transaction record"),
                Err(e) => tracing::warn!(target: "apm", error = %e, "Failed to serialize record"),
            }
        }
    }

    fn shutdown(&self) {
        tracing::info!(target: "apm", app = %self.app_name, "Log reporter shut down");
    }
}

/// Discards every record. Used when the agent is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _record: TransactionRecord) {}
}

/// Keeps finished records in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<TransactionRecord>>,
    shutdowns: AtomicUsize,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record reported so far, in report order.
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of times `shutdown` has been called.
    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, record: TransactionRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
