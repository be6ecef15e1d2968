//! Route handlers.

use crate::client_ip::extract_client_ip;
use crate::error::ApiError;
use crate::AppState;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::{future, Stream, StreamExt};
use n2n_netstate::{
    AnnotatedNode, AuthOutcome, DiagnosticOutput, NetworkStats, RelayPair, Topology,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "n2n-admin",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<AnnotatedNode>>, ApiError> {
    Ok(Json(state.api.list_nodes().await?))
}

pub async fn active_relays(State(state): State<AppState>) -> Json<Vec<RelayPair>> {
    Json(state.api.active_relays())
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<NetworkStats>, ApiError> {
    Ok(Json(state.api.stats().await?))
}

pub async fn topology(State(state): State<AppState>) -> Result<Json<Topology>, ApiError> {
    Ok(Json(state.api.topology().await?))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    pub username: String,
}

/// Throttled credential check. Session issuance is left to the caller.
pub async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let client = extract_client_ip(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.trust_proxy_headers,
    );

    // password hashing is CPU-bound
    let auth = state.auth.clone();
    let username = request.username.clone();
    let outcome =
        tokio::task::spawn_blocking(move || auth.authenticate(client, &username, &request.password))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

    match outcome {
        AuthOutcome::Granted => Ok(Json(LoginResponse {
            status: "ok".to_string(),
            username: request.username,
        })),
        AuthOutcome::Denied => Err(ApiError::Unauthorized),
        AuthOutcome::Locked { remaining } => Err(ApiError::Locked { remaining }),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
}

pub async fn recent_logs(State(state): State<AppState>) -> Result<Json<LogsResponse>, ApiError> {
    let logs = state.logs.recent_lines().await?;
    Ok(Json(LogsResponse { logs }))
}

/// Follow the daemon log. Each line is one `data:` event; the stream ends
/// at the first read error or when the client goes away.
pub async fn stream_logs(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let lines = state.logs.follow().await?;
    debug!("Log stream opened");

    let events = lines
        .take_while(|line| {
            if let Err(e) = line {
                warn!(error = %e, "Log stream ended");
            }
            future::ready(line.is_ok())
        })
        .filter_map(|line| future::ready(line.ok()))
        .map(|line| Ok::<_, Infallible>(Event::default().data(line.replace('\r', ""))));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    pub command: String,
    pub target: String,
}

/// Run an allowed diagnostic tool. A failed run is still a 200 with
/// `error` set; refused requests are 400 or 403.
pub async fn run_tool(
    State(state): State<AppState>,
    Json(request): Json<ToolRequest>,
) -> Result<Json<DiagnosticOutput>, ApiError> {
    Ok(Json(
        state
            .diagnostics
            .run(&request.command, &request.target)
            .await?,
    ))
}

/// Prometheus text exposition of the default registry.
pub async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    ))
}
