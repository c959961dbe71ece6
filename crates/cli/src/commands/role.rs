//! Role bootstrap command.
//!
//! Writes claims straight to the identity store. This is the way to grant
//! the first super-admin besides the configured bootstrap principal, since
//! the HTTP path needs an already-authorized caller.
//!
//! # Usage
//!
//! ```bash
//! menuboard-cli role set --uid u1 --role superadmin --email owner@example.com
//! menuboard-cli role set --uid u2 --role host --subdomain pizza
//! ```

use sqlx::PgPool;
use thiserror::Error;

use menuboard_core::{
    ClaimsError, CustomClaims, Email, EmailError, Role, RoleError, Subdomain, SubdomainError, Uid,
};
use menuboard_functions::db::PgIdentityStore;
use menuboard_functions::store::{IdentityStore, StoreError};

#[derive(Debug, Error)]
pub enum RoleCommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("uid cannot be empty")]
    EmptyUid,

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Subdomain(#[from] SubdomainError),

    #[error(transparent)]
    Claims(#[from] ClaimsError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Build the claim set the command will write.
fn claims_for(role: &str, subdomain: Option<&str>) -> Result<CustomClaims, RoleCommandError> {
    let role: Role = role.parse()?;
    let subdomain = match (role, subdomain) {
        (Role::Host, Some(s)) => Some(Subdomain::parse(s)?),
        _ => None,
    };
    Ok(CustomClaims::for_role(role, subdomain)?)
}

/// Overwrite the claims of `uid`, creating the identity record if missing.
pub async fn set(
    uid: &str,
    role: &str,
    subdomain: Option<&str>,
    email: Option<&str>,
) -> Result<(), RoleCommandError> {
    dotenvy::dotenv().ok();

    let uid = Uid::new(uid.trim());
    if uid.is_blank() {
        return Err(RoleCommandError::EmptyUid);
    }
    let claims = claims_for(role, subdomain)?;
    let email = email.map(Email::parse).transpose()?;

    let database_url = super::database_url()
        .ok_or(RoleCommandError::MissingEnvVar("FUNCTIONS_DATABASE_URL"))?;

    tracing::info!("Connecting to functions database...");
    let pool = PgPool::connect(&database_url).await?;
    let identities = PgIdentityStore::new(pool);

    if identities.get_user(&uid).await?.is_none() {
        tracing::info!("Creating identity record for {}", uid);
        identities.create_user(&uid, email.as_ref()).await?;
    }

    identities.set_custom_claims(&uid, &claims).await?;
    tracing::info!(
        "Set role {} for {}{}",
        claims.role,
        uid,
        claims
            .subdomain
            .as_ref()
            .map(|s| format!(" (subdomain {s})"))
            .unwrap_or_default()
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_for_host_requires_subdomain() {
        assert!(matches!(
            claims_for("host", None),
            Err(RoleCommandError::Claims(ClaimsError::HostRequiresSubdomain))
        ));
        let claims = claims_for("host", Some("pizza")).unwrap();
        assert_eq!(claims.subdomain.unwrap().as_str(), "pizza");
    }

    #[test]
    fn test_claims_for_drops_subdomain_for_other_roles() {
        let claims = claims_for("superadmin", Some("pizza")).unwrap();
        assert_eq!(claims.role, Role::SuperAdmin);
        assert!(claims.subdomain.is_none());
        assert!(matches!(
            claims_for("owner", None),
            Err(RoleCommandError::Role(_))
        ));
    }
}
