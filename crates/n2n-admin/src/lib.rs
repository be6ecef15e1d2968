//! # n2n Admin Router
//!
//! Thin JSON surface over the network-state core.
//!
//! | Route | Method | Body |
//! |-------|--------|------|
//! | `/health` | GET | service status |
//! | `/api/nodes` | GET | annotated node listing |
//! | `/api/relays` | GET | active relay pairs |
//! | `/api/stats` | GET | node, community and online counts |
//! | `/api/topology` | GET | star graph around the supernode |
//! | `/api/login` | POST | throttled credential check |
//! | `/api/logs` | GET | recent supernode log lines |
//! | `/api/logs/stream` | GET | live log lines as server-sent events |
//! | `/api/tools` | POST | `ping` or `traceroute` run on the host |
//! | `/metrics` | GET | Prometheus text format |

pub mod client_ip;
pub mod cors;
pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use n2n_netstate::{AuthGate, Diagnostics, LogViewer, NetworkStateApi, ServerConfig};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn NetworkStateApi>,
    pub auth: Arc<AuthGate>,
    pub logs: Arc<LogViewer>,
    pub diagnostics: Arc<Diagnostics>,
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(
        api: Arc<dyn NetworkStateApi>,
        auth: Arc<AuthGate>,
        logs: Arc<LogViewer>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            api,
            auth,
            logs,
            diagnostics,
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}

/// Build the admin router with tracing and CORS layers.
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors::create_cors_layer(&server.cors_origins));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/nodes", get(handlers::list_nodes))
        .route("/api/relays", get(handlers::active_relays))
        .route("/api/stats", get(handlers::stats))
        .route("/api/topology", get(handlers::topology))
        .route("/api/login", post(handlers::login))
        .route("/api/logs", get(handlers::recent_logs))
        .route("/api/logs/stream", get(handlers::stream_logs))
        .route("/api/tools", post(handlers::run_tool))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware)
        .with_state(state)
}
