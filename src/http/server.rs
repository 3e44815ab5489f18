//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the traced GET handler
//! - Wire up middleware (trace, timeout, request ID)
//! - Serve on a bound listener until the shutdown coordinator fires

use axum::{routing::get, Router};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::apm::Agent;
use crate::config::ServerConfig;
use crate::http::handler::traced_get;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Agent,
}

/// HTTP server for the traced endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server reporting to `agent`.
    pub fn new(config: ServerConfig, agent: Agent) -> Self {
        let state = AppState { agent };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(traced_get))
            .route("/{*path}", get(traced_get))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for serving elsewhere or testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server no longer accepting connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apm::MemoryReporter;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn server() -> (HttpServer, Arc<MemoryReporter>) {
        let reporter = Arc::new(MemoryReporter::new());
        let agent = Agent::new("server-test", reporter.clone());
        (HttpServer::new(ServerConfig::default(), agent), reporter)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn nested_path_is_echoed() {
        let (server, _) = server();
        let request = Request::get("/a/b/c").body(Body::empty()).unwrap();

        let response = server.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body_text(response).await, "Hello, world! You requested: /a/b/c");
    }

    #[tokio::test]
    async fn request_id_is_generated_and_recorded() {
        let (server, reporter) = server();
        let request = Request::get("/foo").body(Body::empty()).unwrap();

        let response = server.router().oneshot(request).await.unwrap();
        let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();

        let records = reporter.records();
        assert_eq!(
            records[0].attributes.get("request_id").map(|v| v.to_string()),
            Some(request_id)
        );
    }

    #[tokio::test]
    async fn non_get_is_rejected_untraced() {
        let (server, reporter) = server();
        let request = Request::post("/foo").body(Body::empty()).unwrap();

        let response = server.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(reporter.records().is_empty());
    }

    #[tokio::test]
    async fn echoed_path_is_decoded_and_normalized() {
        let cases = [
            ("/hello%20world", "/hello world"),
            ("//foo", "/foo"),
            ("/a/../b", "/b"),
            ("/caf%C3%A9", "/café"),
        ];

        for (raw, echoed) in cases {
            let (server, reporter) = server();
            let request = Request::get(raw).body(Body::empty()).unwrap();

            let response = server.router().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{raw}");
            assert_eq!(
                body_text(response).await,
                format!("Hello, world! You requested: {echoed}")
            );
            let records = reporter.records();
            assert_eq!(
                records[0].attributes.get("endpoint").map(|v| v.to_string()),
                Some(echoed.to_string())
            );
        }
    }

    #[tokio::test]
    async fn abnormal_path_is_plain_400_untraced() {
        for raw in ["/..", "/a/../../b", "/%FF"] {
            let (server, reporter) = server();
            let request = Request::get(raw).body(Body::empty()).unwrap();

            let response = server.router().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{raw}");
            assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
            assert_eq!(body_text(response).await, "Bad Request");
            assert!(reporter.records().is_empty());
        }
    }

    #[tokio::test]
    async fn head_is_traced_as_get_transaction() {
        let (server, reporter) = server();
        let request = Request::head("/foo").body(Body::empty()).unwrap();

        let response = server.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.is_empty());
        let records = reporter.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "HTTP_GET");
        let segment = records[0].segment("ProcessRequest").unwrap();
        assert_eq!(
            segment.attributes.get("method").map(|v| v.to_string()),
            Some("HEAD".to_string())
        );
    }
}
