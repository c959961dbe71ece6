//! Identity token minting.
//!
//! # Usage
//!
//! ```bash
//! menuboard-cli token mint --uid u1 --ttl-secs 600
//! ```
//!
//! # Environment Variables
//!
//! - `FUNCTIONS_TOKEN_SECRET` - Same signing secret the functions server uses

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use menuboard_core::Uid;
use menuboard_functions::token::{IdTokenVerifier, TokenError};

#[derive(Debug, Error)]
pub enum TokenCommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

/// Print a bearer token for `uid` valid for `ttl_secs`.
pub fn mint(uid: &str, ttl_secs: u64) -> Result<(), TokenCommandError> {
    dotenvy::dotenv().ok();

    let secret = std::env::var("FUNCTIONS_TOKEN_SECRET")
        .map_err(|_| TokenCommandError::MissingEnvVar("FUNCTIONS_TOKEN_SECRET"))?;
    let verifier = IdTokenVerifier::new(SecretString::from(secret));
    let token = verifier.mint(&Uid::new(uid.trim()), Duration::from_secs(ttl_secs))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
