//! In-process APM agent.
//!
//! # Data Flow
//! ```text
//! Agent::start_transaction(name, category)
//!     → Transaction (owned by the request handler)
//!         → add_custom_attributes (transaction scope)
//!         → start_segment(name) → Segment<'_> (borrows the transaction)
//!             → add_custom_attributes (segment scope)
//!             → finish() or drop → SegmentRecord pushed onto the transaction
//!     → end() or drop → TransactionRecord
//!     → Reporter::report (log, memory, noop)
//!
//! Agent::shutdown → Reporter::shutdown (once)
//! ```
//!
//! # Design Decisions
//! - No ambient "current transaction": handlers hold the guard explicitly
//! - Segment lifetimes are tied to the transaction borrow
//! - Drop finalizes, so every exit path closes segments and transactions

pub mod agent;
pub mod attributes;
pub mod record;
pub mod reporter;
pub mod segment;
pub mod transaction;

pub use agent::{Agent, AgentStats};
pub use attributes::{AttributeValue, CustomAttributes};
pub use record::{SegmentRecord, TransactionCategory, TransactionRecord};
pub use reporter::{LogReporter, MemoryReporter, NoopReporter, Reporter};
pub use segment::Segment;
pub use transaction::Transaction;
