//! The agent: entry point for starting transactions and owner of the reporter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::apm::record::{TransactionCategory, TransactionRecord};
use crate::apm::reporter::{LogReporter, NoopReporter, Reporter};
use crate::apm::transaction::Transaction;
use crate::config::{AgentConfig, ReporterKind};
use crate::observability::metrics;

/// Point-in-time view of the agent's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    pub transactions_started: u64,
    pub transactions_reported: u64,
    pub transactions_discarded: u64,
    pub segments_started: u64,
    pub segments_finished: u64,
}

#[derive(Default)]
struct Counters {
    transactions_started: AtomicU64,
    transactions_reported: AtomicU64,
    transactions_discarded: AtomicU64,
    segments_started: AtomicU64,
    segments_finished: AtomicU64,
}

struct AgentInner {
    app_name: String,
    enabled: bool,
    reporter: Arc<dyn Reporter>,
    shut_down: AtomicBool,
    counters: Counters,
}

/// Cheaply cloneable handle to the tracing agent.
///
/// Transactions hold a clone so they can report themselves when they end.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

impl Agent {
    /// Create an enabled agent reporting to `reporter`.
    pub fn new(app_name: impl Into<String>, reporter: Arc<dyn Reporter>) -> Self {
        Self::build(app_name.into(), true, reporter)
    }

    /// Create an agent that times transactions but reports nothing.
    pub fn disabled() -> Self {
        Self::build(String::new(), false, Arc::new(NoopReporter))
    }

    /// Build an agent from configuration.
    pub fn from_config(config: &AgentConfig) -> Self {
        if !config.enabled {
            tracing::info!("APM agent disabled");
            return Self::disabled();
        }

        let reporter: Arc<dyn Reporter> = match config.reporter {
            ReporterKind::Log => Arc::new(LogReporter::new(config.app_name.clone())),
            ReporterKind::None => Arc::new(NoopReporter),
        };

        tracing::info!(
            app_name = %config.app_name,
            reporter = ?config.reporter,
            "APM agent started"
        );

        Self::new(config.app_name.clone(), reporter)
    }

    fn build(app_name: String, enabled: bool, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            inner: Arc::new(AgentInner {
                app_name,
                enabled,
                reporter,
                shut_down: AtomicBool::new(false),
                counters: Counters::default(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Open a transaction. It is reported when ended or dropped.
    pub fn start_transaction(
        &self,
        name: impl Into<String>,
        category: TransactionCategory,
    ) -> Transaction {
        self.inner
            .counters
            .transactions_started
            .fetch_add(1, Ordering::Relaxed);
        Transaction::start(self.clone(), name.into(), category)
    }

    /// Shut the reporter down, flushing buffered records.
    ///
    /// Returns `true` for the call that performed the shutdown and `false`
    /// for every later call.
    pub fn shutdown(&self) -> bool {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("APM agent already shut down");
            return false;
        }

        let stats = self.stats();
        tracing::info!(
            transactions_reported = stats.transactions_reported,
            transactions_discarded = stats.transactions_discarded,
            "Shutting down APM agent"
        );

        self.inner.reporter.shutdown();
        true
    }

    pub fn stats(&self) -> AgentStats {
        let c = &self.inner.counters;
        AgentStats {
            transactions_started: c.transactions_started.load(Ordering::Relaxed),
            transactions_reported: c.transactions_reported.load(Ordering::Relaxed),
            transactions_discarded: c.transactions_discarded.load(Ordering::Relaxed),
            segments_started: c.segments_started.load(Ordering::Relaxed),
            segments_finished: c.segments_finished.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn segment_started(&self) {
        self.inner
            .counters
            .segments_started
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn segment_finished(&self) {
        self.inner
            .counters
            .segments_finished
            .fetch_add(1, Ordering::Relaxed);
        metrics::record_segment();
    }

    pub(crate) fn finish_transaction(&self, record: TransactionRecord) {
        if self.is_shut_down() {
            self.inner
                .counters
                .transactions_discarded
                .fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                transaction = %record.name,
                "Transaction finished after agent shutdown, discarding"
            );
            return;
        }

        metrics::record_transaction(record.category, record.duration);

        if self.inner.enabled {
            self.inner.reporter.report(record);
            self.inner
                .counters
                .transactions_reported
                .fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("app_name", &self.inner.app_name)
            .field("enabled", &self.inner.enabled)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
