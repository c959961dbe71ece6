//! Menuboard functions library.
//!
//! The privileged backend of a multi-tenant restaurant menu platform:
//! super-admin role assignment, tenant deletion, public order submission
//! with best-effort owner notification, and the subdomain registry.
//!
//! Exposed as a library so the router can be exercised in-process by the
//! integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod token;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;
use store::DocumentBackend;

/// Build the full application: routes, health checks, tracing and Sentry.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.documents() {
        DocumentBackend::Postgres(store) => match store.ping().await {
            Ok(()) => StatusCode::OK,
            Err(e) => {
                tracing::warn!(error = %e, "Readiness check failed");
                StatusCode::SERVICE_UNAVAILABLE
            }
        },
        DocumentBackend::Memory(_) => StatusCode::OK,
    }
}
