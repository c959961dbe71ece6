//! Role assignment: the only writer of custom claims.

use tracing::{info, instrument};

use menuboard_core::{CustomClaims, Role, RoleInfo, Subdomain, Uid};

use crate::error::FunctionError;
use crate::services::authz::AuthorizationContext;
use crate::store::IdentityStore;

/// Reads and overwrites users' roles.
#[derive(Clone)]
pub struct RoleService<I> {
    identities: I,
}

impl<I: IdentityStore> RoleService<I> {
    pub const fn new(identities: I) -> Self {
        Self { identities }
    }

    /// Replace the target's claim set with `{role, subdomain}`.
    ///
    /// Checks run in order and the first failure wins: uid present, role
    /// known, subdomain present and valid for `host`. A subdomain sent with
    /// any other role is ignored and stored as `null`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for bad input, `Internal` if the identity store fails.
    #[instrument(
        skip(self, ctx),
        fields(caller = %ctx.caller(), caller_role = %ctx.role(), bootstrap = ctx.is_bootstrap())
    )]
    pub async fn set_role(
        &self,
        ctx: &AuthorizationContext,
        uid: &str,
        role: &str,
        subdomain: Option<&str>,
    ) -> Result<RoleInfo, FunctionError> {
        let target = require_uid(uid)?;
        let role: Role = role.trim().parse()?;
        let subdomain = match (role, subdomain.map(str::trim)) {
            (Role::Host, Some(s)) if !s.is_empty() => Some(Subdomain::parse(s)?),
            _ => None,
        };
        let claims = CustomClaims::for_role(role, subdomain)?;

        self.identities.set_custom_claims(&target, &claims).await?;

        info!(
            target_uid = %target,
            role = %claims.role,
            subdomain = claims.subdomain.as_ref().map(Subdomain::as_str),
            "Custom claims replaced"
        );
        Ok(RoleInfo::from_claims(Some(&claims)))
    }

    /// The target's effective role, `{guest, null}` when no claims exist.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty uid, `Internal` if the identity store fails.
    #[instrument(skip(self, ctx), fields(caller = %ctx.caller()))]
    pub async fn role_info(
        &self,
        ctx: &AuthorizationContext,
        uid: &str,
    ) -> Result<RoleInfo, FunctionError> {
        let target = require_uid(uid)?;
        let record = self.identities.get_user(&target).await?;
        Ok(RoleInfo::from_claims(
            record.as_ref().and_then(|r| r.claims.as_ref()),
        ))
    }
}

/// Parse a required target uid.
pub(crate) fn require_uid(uid: &str) -> Result<Uid, FunctionError> {
    let uid = Uid::new(uid.trim());
    if uid.is_blank() {
        return Err(FunctionError::InvalidArgument("uid is required".to_owned()));
    }
    Ok(uid)
}
