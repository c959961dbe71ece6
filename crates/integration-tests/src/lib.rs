//! Integration tests for Menuboard.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests (no external services)
//! cargo test -p menuboard-integration-tests
//!
//! # Postgres-backed store tests
//! FUNCTIONS_DATABASE_URL=postgres://... cargo test -p menuboard-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `functions_api` - Callable functions through the full router
//! - `orders_api` - Order submission and notification
//! - `subdomains_api` - Subdomain availability and claims
//! - `postgres_stores` - Document and identity stores against a real database

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use menuboard_core::{CustomClaims, Role, Subdomain, Uid};
use menuboard_functions::services::{Mailer, RecordingMailer};
use menuboard_functions::state::AppState;
use menuboard_functions::store::{
    DocPath, DocumentBackend, DocumentStore, IdentityBackend, MemoryDocumentStore,
    MemoryIdentityStore,
};
use menuboard_functions::token::IdTokenVerifier;

/// Uid of the bootstrap principal in every test app.
pub const BOOTSTRAP_UID: &str = "root";

const TOKEN_SECRET: &str = "integration-token-key-0123456789";

/// A fully wired app on in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub documents: MemoryDocumentStore,
    pub identities: MemoryIdentityStore,
    pub mailer: RecordingMailer,
    tokens: IdTokenVerifier,
}

impl TestApp {
    /// Build an app with a bootstrap identity record and no other data.
    pub async fn new() -> Self {
        let documents = MemoryDocumentStore::new();
        let identities = MemoryIdentityStore::new();
        let mailer = RecordingMailer::new();
        let tokens = IdTokenVerifier::new(SecretString::from(TOKEN_SECRET));

        identities
            .insert(BOOTSTRAP_UID, Some("root@menuboard.test"), None)
            .await;

        let (state, _worker) = AppState::new(
            DocumentBackend::Memory(documents.clone()),
            IdentityBackend::Memory(identities.clone()),
            Mailer::Recording(mailer.clone()),
            tokens.clone(),
            Uid::new(BOOTSTRAP_UID),
        );

        Self {
            router: menuboard_functions::app(state),
            documents,
            identities,
            mailer,
            tokens,
        }
    }

    /// A valid bearer token for `uid`.
    pub fn token(&self, uid: &str) -> String {
        self.tokens
            .mint(&Uid::new(uid), Duration::from_secs(300))
            .unwrap()
    }

    /// Register a user with the given role.
    pub async fn add_user(&self, uid: &str, role: Role, subdomain: Option<&str>) {
        let claims =
            CustomClaims::for_role(role, subdomain.map(|s| Subdomain::parse(s).unwrap())).unwrap();
        self.identities
            .insert(uid, Some(&format!("{uid}@menuboard.test")), Some(claims))
            .await;
    }

    /// Write a document at `path`.
    pub async fn put(&self, path: &str, data: Value) {
        self.documents
            .set(&DocPath::parse(path).unwrap(), data)
            .await
            .unwrap();
    }

    /// Send a request through the router and decode the JSON response.
    ///
    /// Non-JSON bodies come back as a JSON string.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    /// POST a callable function as `caller`.
    pub async fn function(
        &self,
        name: &str,
        caller: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let token = caller.map(|uid| self.token(uid));
        self.call(
            Method::POST,
            &format!("/functions/{name}"),
            token.as_deref(),
            Some(body),
        )
        .await
    }

    /// Wait until the notification worker has attempted `n` sends.
    pub async fn wait_for_mail_attempts(&self, n: usize) {
        for _ in 0..200 {
            if self.mailer.attempts() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} mail attempts, saw {}", self.mailer.attempts());
    }
}

/// The `error.status` field of an error body.
pub fn error_status(body: &Value) -> &str {
    body["error"]["status"].as_str().unwrap_or_default()
}
