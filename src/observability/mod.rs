//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Request transactions and segments live in the `apm` module; the log
//! reporter emits them through the same subscriber under the `apm` target.
//! ```

pub mod logging;
pub mod metrics;
