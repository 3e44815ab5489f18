//! Segment guard: a timed sub-interval of a transaction.

use std::fmt::Display;
use std::mem;
use std::time::{Duration, Instant};

use crate::apm::attributes::{AttributeValue, CustomAttributes};
use crate::apm::record::SegmentRecord;
use crate::apm::transaction::Transaction;

/// A named sub-operation nested in a [`Transaction`].
///
/// Holds the transaction's mutable borrow for its whole life, so it cannot
/// outlive the transaction or be shared with another request. Finished
/// exactly once: by [`Segment::finish`] or on drop, including drops during
/// panic unwinding.
#[must_use = "a segment is finished when it is dropped"]
pub struct Segment<'t> {
    transaction: &'t mut Transaction,
    name: String,
    start: Instant,
    start_offset: Duration,
    attributes: CustomAttributes,
    error: Option<String>,
    finished: bool,
}

impl<'t> Segment<'t> {
    pub(super) fn start(transaction: &'t mut Transaction, name: String) -> Self {
        transaction.agent().segment_started();
        tracing::trace!(transaction = %transaction.name(), segment = %name, "Segment started");
        Self {
            start_offset: transaction.elapsed(),
            start: Instant::now(),
            transaction,
            name,
            attributes: CustomAttributes::new(),
            error: None,
            finished: false,
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

    pub fn notice_error(&mut self, error: &dyn Display) {
        self.error = Some(error.to_string());
    }

    /// Finish the segment now.
    pub fn finish(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let record = SegmentRecord {
            name: mem::take(&mut self.name),
            start_offset: self.start_offset,
            duration: self.start.elapsed(),
            attributes: mem::take(&mut self.attributes),
            error: self.error.take(),
        };

        tracing::trace!(
            segment = %record.name,
            duration_us = record.duration.as_micros() as u64,
            "Segment finished"
        );
        self.transaction.agent().segment_finished();
        self.transaction.push_segment(record);
    }
}

impl Drop for Segment<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
