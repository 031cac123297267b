//! HTTP API server.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind the listener; report bind failures to the shutdown arbiter
//! - Bridge reload and quit requests into the lifecycle
//! - Serve the current configuration and reload status

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::admin::setup_admin_router;
use crate::config::MonitorConfig;
use crate::http::request::request_id_layers;
use crate::lifecycle::{Service, TerminationSenders};
use crate::reload::{ApplyError, ReloadRequester, ReloadStatus, Reloadable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bridge into the reload coordinator.
    pub reload: ReloadRequester,
    /// Quit and listen-error sources raced by the shutdown arbiter.
    pub termination: TerminationSenders,
    pub status: Arc<ReloadStatus>,
    /// Configuration last applied to the API.
    pub config: Arc<ArcSwapOption<MonitorConfig>>,
    /// Shared with the rule evaluator; cancelled when teardown begins.
    pub query_token: CancellationToken,
    pub metrics: Option<PrometheusHandle>,
    /// Bearer token required by the lifecycle endpoints, if set.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        reload: ReloadRequester,
        termination: TerminationSenders,
        status: Arc<ReloadStatus>,
        query_token: CancellationToken,
    ) -> Self {
        Self {
            reload,
            termination,
            status,
            config: Arc::new(ArcSwapOption::empty()),
            query_token,
            metrics: None,
            admin_token: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_admin_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.admin_token = Some(token.into());
        self
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/-/healthy", get(healthy))
        .route("/-/ready", get(ready))
        .route("/api/v1/status/config", get(status_config))
        .route("/api/v1/status/reload", get(status_reload))
        .route("/metrics", get(render_metrics))
        .with_state(state.clone())
        .merge(setup_admin_router(state))
        .layer(propagate_request_id)
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id)
}

/// The externally reachable API surface.
pub struct ApiServer {
    listen_address: String,
    state: AppState,
    stop: CancellationToken,
    local_addr: OnceLock<SocketAddr>,
}

impl ApiServer {
    pub fn new(listen_address: impl Into<String>, state: AppState) -> Self {
        Self {
            listen_address: listen_address.into(),
            state,
            stop: CancellationToken::new(),
            local_addr: OnceLock::new(),
        }
    }

    /// Address actually bound, once `run` got that far.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

impl Reloadable for ApiServer {
    fn name(&self) -> &str {
        "web"
    }

    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError> {
        self.state.config.store(Some(config.clone()));
        Ok(())
    }
}

#[async_trait]
impl Service for ApiServer {
    fn name(&self) -> &'static str {
        "web"
    }

    async fn run(&self) {
        let listener = match TcpListener::bind(&self.listen_address).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(address = %self.listen_address, error = %e, "Failed to bind web listener");
                self.state.termination.report_listen_error(e);
                return;
            }
        };
        if let Ok(addr) = listener.local_addr() {
            let _ = self.local_addr.set(addr);
            tracing::info!(address = %addr, "HTTP server starting");
        }

        let stop = self.stop.clone();
        let app = build_router(self.state.clone());
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await
        {
            tracing::error!(error = %e, "HTTP server error");
        }

        tracing::info!("HTTP server stopped");
    }

    fn stop(&self) {
        self.stop.cancel();
    }
}

async fn healthy() -> &'static str {
    "Monitoring server is Healthy.\n"
}

async fn ready(State(state): State<AppState>) -> Response {
    if state.query_token.is_cancelled() {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable\n").into_response()
    } else {
        (StatusCode::OK, "Monitoring server is Ready.\n").into_response()
    }
}

async fn status_config(State(state): State<AppState>) -> Response {
    match state.config.load_full() {
        Some(config) => Json(config.as_ref().clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "No configuration loaded\n").into_response(),
    }
}

async fn status_reload(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.status.snapshot())
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics recorder not installed\n").into_response(),
    }
}
