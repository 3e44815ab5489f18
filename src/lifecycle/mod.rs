//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Logging → Metrics → Agent → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Agent shutdown → Exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → run_until_signal → Trigger graceful shutdown
//!     Signal listener error → keep serving
//! ```
//!
//! # Design Decisions
//! - Listener binds last (traffic only when ready)
//! - Agent flushes only after requests drain, bounded by a timeout

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{run_until_signal, shutdown_gracefully, ServeError, Shutdown, ShutdownOutcome};
pub use signals::{wait_for_signal, ShutdownSignal};
