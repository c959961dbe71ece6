//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! menuboard-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FUNCTIONS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/functions/migrations/`

use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the functions database migrations.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url =
        super::database_url().ok_or(MigrationError::MissingEnvVar("FUNCTIONS_DATABASE_URL"))?;

    tracing::info!("Connecting to functions database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../functions/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
