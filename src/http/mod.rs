//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve)
//!     → server.rs (router, middleware: request ID, trace, timeout)
//!     → path.rs (decode and normalize the echoed path)
//!     → handler.rs (transaction → segment → response)
//!     → Send to client
//! ```

pub mod handler;
pub mod path;
pub mod server;

pub use handler::{handle_traced, greeting, HandlerError, RequestInfo};
pub use path::{normalize_request_path, PathError};
pub use server::{AppState, HttpServer};
