//! HTTP front for the Mailchimp dispatch table.
//!
//! `POST /api/mailchimp` takes an envelope, forwards exactly one request to
//! Mailchimp and answers `{data}` or `{error, status}`. `OPTIONS` on the same
//! path answers the CORS preflight. Handlers share no mutable state.

pub mod config;
pub mod error;
pub mod forward;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mailchimp_core::{
    interpret_response, upstream_request, Envelope, ProxySuccess, Route, RouteError, PROXY_PATH,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use config::ProxyConfig;
pub use error::ProxyError;

#[derive(Clone)]
pub struct AppState {
    config: Arc<ProxyConfig>,
    http: reqwest::Client,
}

pub fn app(config: ProxyConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        http: reqwest::Client::new(),
    };
    Router::new()
        .route(PROXY_PATH, post(dispatch).options(preflight))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: ProxyConfig) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, upstream = config.upstream.template(), "mailchimp proxy listening");
    }
    axum::serve(listener, app(config)).await
}

async fn dispatch(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProxySuccess<Value>>, ProxyError> {
    let request_id = Uuid::new_v4();
    let Json(raw) = payload.map_err(|rejection| {
        warn!(%request_id, error = %rejection.body_text(), "rejected malformed envelope");
        ProxyError::Envelope(rejection.body_text())
    })?;

    // An unknown tag is reported as such even when the rest of the envelope is bad.
    if let Some(endpoint) = raw.get("endpoint").and_then(Value::as_str) {
        if !Route::is_known_endpoint(endpoint) {
            warn!(%request_id, %endpoint, "rejected unknown endpoint");
            return Err(RouteError::InvalidEndpoint(endpoint.to_string()).into());
        }
    }
    let envelope: Envelope = serde_json::from_value(raw).map_err(|err| {
        warn!(%request_id, error = %err, "rejected malformed envelope");
        ProxyError::Envelope(err.to_string())
    })?;
    debug!(%request_id, method = %envelope.method, endpoint = %envelope.endpoint, "dispatching");

    let request = upstream_request(&envelope, &state.config.upstream).map_err(|err| {
        warn!(%request_id, endpoint = %envelope.endpoint, error = %err, "rejected envelope");
        ProxyError::from(err)
    })?;
    debug!(%request_id, method = %request.method, url = %request.path, "forwarding upstream");

    let response = forward::execute(&state.http, request).await.map_err(|err| {
        error!(%request_id, error = %err, "upstream unreachable");
        err
    })?;
    debug!(%request_id, status = response.status, "upstream responded");

    let data = interpret_response(&response).map_err(|err| {
        error!(%request_id, status = response.status, error = %err, "upstream call failed");
        ProxyError::from(err)
    })?;
    Ok(Json(ProxySuccess { data }))
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                "GET, POST, PUT, DELETE, OPTIONS",
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, Authorization",
            ),
        ],
    )
}

async fn health() -> &'static str {
    "OK"
}
