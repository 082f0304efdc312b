//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, access log, timeout, body limit)
//! - Serve on a bound listener until shutdown is broadcast

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ServerConfig, ServiceConfig};
use crate::http::handlers;
use crate::http::middleware::track_requests;
use crate::http::request::UuidRequestId;
use crate::lifecycle::build_service;
use crate::users::UserService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<UserService>,
    /// Present when the Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP server for the user service.
pub struct HttpServer {
    config: ServiceConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server and build its service graph from config.
    pub fn new(config: ServiceConfig) -> Self {
        let service = Arc::new(build_service(&config));
        Self::with_service(config, service)
    }

    /// Create a server around an already built service.
    pub fn with_service(config: ServiceConfig, service: Arc<UserService>) -> Self {
        Self {
            config,
            state: AppState {
                service,
                metrics: None,
            },
        }
    }

    /// Serve `/metrics` from the given recorder handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    /// The router with every route and middleware layer attached.
    pub fn router(&self) -> Router {
        build_router(&self.config.server, self.state.clone())
    }

    /// Run the server until a shutdown signal is broadcast, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router().into_make_service();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn service(&self) -> &Arc<UserService> {
        &self.state.service
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layers are added innermost first.
#[allow(deprecated)]
fn build_router(config: &ServerConfig, state: AppState) -> Router {
    Router::new()
        .route("/user", post(handlers::create_user))
        .route("/user/{user_id}", get(handlers::get_user))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(from_fn_with_state(state.clone(), track_requests))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
