//! Minimal HTTP server with APM transaction and segment tracing.

pub mod apm;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use apm::Agent;
pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
