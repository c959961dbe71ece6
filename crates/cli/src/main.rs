//! Menuboard CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! menuboard-cli migrate
//!
//! # Grant a role directly (bootstrap, no caller token needed)
//! menuboard-cli role set --uid u1 --role superadmin
//! menuboard-cli role set --uid u2 --role host --subdomain pizza
//!
//! # Mint an identity token for manual testing
//! menuboard-cli token mint --uid u1 --ttl-secs 3600
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `role set` - Overwrite a user's custom claims
//! - `token mint` - Print a signed bearer token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "menuboard-cli")]
#[command(author, version, about = "Menuboard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user roles
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },
    /// Work with identity tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Overwrite a user's role, creating the identity record if needed
    Set {
        /// Target user id
        #[arg(short, long)]
        uid: String,

        /// Role (`guest`, `host`, `superadmin`)
        #[arg(short, long)]
        role: String,

        /// Subdomain (required for `host`)
        #[arg(short, long)]
        subdomain: Option<String>,

        /// Email stored when the identity record is created
        #[arg(short, long)]
        email: Option<String>,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Mint a bearer token for a user
    Mint {
        /// User id the token identifies
        #[arg(short, long)]
        uid: String,

        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Role { action } => match action {
            RoleAction::Set {
                uid,
                role,
                subdomain,
                email,
            } => {
                commands::role::set(&uid, &role, subdomain.as_deref(), email.as_deref()).await?;
            }
        },
        Commands::Token { action } => match action {
            TokenAction::Mint { uid, ttl_secs } => commands::token::mint(&uid, ttl_secs)?,
        },
    }
    Ok(())
}
