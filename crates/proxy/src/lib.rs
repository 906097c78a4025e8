//! HTTP layer of the agent: axum router, request pipeline and SSE relay.
//!
//! Exposes the signed agent endpoint on `POST /` and a liveness check on
//! `GET /health`.

mod agent;
mod error;
pub mod relay;
pub mod sse;

pub use agent::{KEY_ID_HEADER, SIGNATURE_HEADER, TOKEN_HEADER};
pub use error::ApiError;
pub use sse::RelayFrame;

use agent_auth::SignatureVerifier;
use agent_config::Config;
use agent_types::{ChatProvider, KeyStore, ProfileLookup};
use axum::{
    Json, Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Shared application state passed to all route handlers.
pub struct AppState {
    /// Resolved once at startup and never changed.
    pub config: Arc<Config>,
    pub verifier: SignatureVerifier,
    /// Enrichment source for the optional user token.
    pub profile: Arc<dyn ProfileLookup>,
    pub provider: Arc<dyn ChatProvider>,
}

impl AppState {
    /// Creates a new shared application state wrapped in an `Arc`.
    pub fn new(
        config: Arc<Config>,
        keys: Arc<dyn KeyStore>,
        profile: Arc<dyn ProfileLookup>,
        provider: Arc<dyn ChatProvider>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            verifier: SignatureVerifier::new(keys),
            profile,
            provider,
        })
    }
}

/// Build the full axum router.
///
/// Routes:
/// - POST /        signed agent endpoint (SSE)
/// - GET  /health  liveness
pub fn make_router(state: Arc<AppState>) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let request_id = req
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        tracing::info_span!(
            "request",
            method = %req.method(),
            uri = %req.uri(),
            request_id
        )
    });

    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", post(agent::handle))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
