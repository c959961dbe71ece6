//! CLI subcommand implementations.

pub mod migrate;
pub mod role;
pub mod token;

/// Get the functions database URL, falling back to `DATABASE_URL`.
pub fn database_url() -> Option<String> {
    std::env::var("FUNCTIONS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}
