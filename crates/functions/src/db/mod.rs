//! `PostgreSQL` implementations of the document and identity stores.
//!
//! # Tables
//!
//! - `documents` - every tenant document, keyed by its full path, with its
//!   parent collection path indexed for listing and field queries
//! - `identities` - identity records with their custom claims (JSONB)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/functions/migrations/` and run via:
//! ```bash
//! cargo run -p menuboard-cli -- migrate
//! ```

pub mod documents;
pub mod identities;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use documents::PgDocumentStore;
pub use identities::PgIdentityStore;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
