//! Menuboard functions - privileged backend for the menu platform.
//!
//! This binary serves the callable functions on port 3002.
//!
//! # Architecture
//!
//! - Axum web framework
//! - `PostgreSQL` document and identity stores
//! - HMAC-signed bearer identity tokens
//! - SMTP (lettre) with Askama templates for order notifications
//!
//! # Security
//!
//! Every privileged operation re-reads the caller's claims from the identity
//! store. The bootstrap principal (`BOOTSTRAP_SUPERADMIN_UID`) is always
//! authorized and can never be deleted.

#![cfg_attr(not(test), forbid(unsafe_code))]

use menuboard_functions::config::FunctionsConfig;
use menuboard_functions::db::{self, PgDocumentStore, PgIdentityStore};
use menuboard_functions::services::{EmailService, Mailer};
use menuboard_functions::state::AppState;
use menuboard_functions::store::{DocumentBackend, IdentityBackend};
use menuboard_functions::token::IdTokenVerifier;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &FunctionsConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = FunctionsConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "menuboard_functions=info,tower_http=debug".into());

    // Use JSON format on Fly.io for structured log parsing, text format locally
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p menuboard-cli -- migrate

    let mailer = EmailService::new(&config.email).expect("Failed to configure SMTP transport");

    let (state, notifications) = AppState::new(
        DocumentBackend::Postgres(PgDocumentStore::new(pool.clone())),
        IdentityBackend::Postgres(PgIdentityStore::new(pool)),
        Mailer::Smtp(mailer),
        IdTokenVerifier::new(config.token_secret.clone()),
        config.bootstrap_uid.clone(),
    );

    let app = menuboard_functions::app(state);

    let addr = config.socket_addr();
    tracing::info!("functions listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // The router (and with it the last event sender) is gone; let queued
    // notifications finish.
    if let Err(e) = notifications.await {
        tracing::error!(error = %e, "Notification worker panicked");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
