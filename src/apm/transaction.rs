//! Transaction guard.

use std::fmt::Display;
use std::mem;
use std::time::{Duration, Instant, SystemTime};

use crate::apm::agent::Agent;
use crate::apm::attributes::{AttributeValue, CustomAttributes};
use crate::apm::record::{SegmentRecord, TransactionCategory, TransactionRecord};
use crate::apm::segment::Segment;

/// One logical unit of work, such as handling a single HTTP request.
///
/// The transaction is finalized and reported exactly once, either by
/// [`Transaction::end`] or when the value is dropped. Segments borrow the
/// transaction mutably, so every segment is closed before the transaction
/// can end.
#[must_use = "a transaction is reported when it is dropped"]
pub struct Transaction {
    agent: Agent,
    name: String,
    category: TransactionCategory,
    started_at: SystemTime,
    start: Instant,
    attributes: CustomAttributes,
    segments: Vec<SegmentRecord>,
    error: Option<String>,
    ended: bool,
}

impl Transaction {
    pub(crate) fn start(agent: Agent, name: String, category: TransactionCategory) -> Self {
        tracing::trace!(transaction = %name, category = %category, "Transaction started");
        Self {
            agent,
            name,
            category,
            started_at: SystemTime::now(),
            start: Instant::now(),
            attributes: CustomAttributes::new(),
            segments: Vec::new(),
            error: None,
            ended: false,
        }
    }

    pub fn add_custom_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key, value);
    }

    pub fn add_custom_attributes<I, K, V>(&mut self, attrs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        self.attributes.extend(attrs);
    }

    /// Record an error against the transaction. Last error wins.
    pub fn notice_error(&mut self, error: &dyn Display) {
        self.error = Some(error.to_string());
    }

    /// Open a named segment nested in this transaction.
    pub fn start_segment(&mut self, name: impl Into<String>) -> Segment<'_> {
        Segment::start(self, name.into())
    }

    /// End the transaction now instead of at drop.
    pub fn end(mut self) {
        self.finalize();
    }

    pub(super) fn name(&self) -> &str {
        &self.name
    }

    pub(super) fn agent(&self) -> &Agent {
        &self.agent
    }

    pub(super) fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub(super) fn push_segment(&mut self, record: SegmentRecord) {
        self.segments.push(record);
    }

    fn finalize(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        let record = TransactionRecord {
            name: mem::take(&mut self.name),
            category: self.category,
            started_at: self.started_at,
            duration: self.start.elapsed(),
            attributes: mem::take(&mut self.attributes),
            segments: mem::take(&mut self.segments),
            error: self.error.take(),
        };

        tracing::trace!(
            transaction = %record.name,
            duration_us = record.duration.as_micros() as u64,
            "Transaction ended"
        );
        self.agent.finish_transaction(record);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("attributes", &self.attributes)
            .field("segments", &self.segments.len())
            .field("ended", &self.ended)
            .finish()
    }
}
