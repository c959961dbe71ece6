//! Super-admin authorization for privileged operations.
//!
//! Privilege is re-derived from the identity store on every call; nothing is
//! cached between requests. A successful check yields an
//! [`AuthorizationContext`], which is the only way to call a guarded
//! operation.

use tracing::{instrument, warn};

use menuboard_core::{Email, Role, Uid};

use crate::error::FunctionError;
use crate::store::IdentityStore;
use crate::token::VerifiedCaller;

/// Proof that the caller passed the super-admin check for this request.
///
/// Only [`AuthorizationGuard::authorize`] can build one. It is deliberately
/// neither `Clone` nor serializable.
#[derive(Debug)]
pub struct AuthorizationContext {
    caller: Uid,
    email: Option<Email>,
    role: Role,
    bootstrap: bool,
}

impl AuthorizationContext {
    #[must_use]
    pub const fn caller(&self) -> &Uid {
        &self.caller
    }

    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// The caller's role as read from their current claims.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Whether the caller is the bootstrap principal.
    #[must_use]
    pub const fn is_bootstrap(&self) -> bool {
        self.bootstrap
    }
}

/// Checks callers against their current claims and the bootstrap principal.
#[derive(Clone)]
pub struct AuthorizationGuard<I> {
    identities: I,
    bootstrap_uid: Uid,
}

impl<I: IdentityStore> AuthorizationGuard<I> {
    pub const fn new(identities: I, bootstrap_uid: Uid) -> Self {
        Self {
            identities,
            bootstrap_uid,
        }
    }

    /// Authorize `caller` as a super-admin.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` when no verified caller is present
    /// - `PermissionDenied` when the caller has no identity record or is not
    ///   a super-admin (the bootstrap principal always passes)
    /// - `Internal` when the identity store fails
    #[instrument(skip_all, fields(uid))]
    pub async fn authorize(
        &self,
        caller: Option<&VerifiedCaller>,
    ) -> Result<AuthorizationContext, FunctionError> {
        let caller = caller.ok_or_else(|| {
            FunctionError::Unauthenticated("a verified identity token is required".to_owned())
        })?;
        tracing::Span::current().record("uid", caller.uid.as_str());

        let record = self.identities.get_user(&caller.uid).await?;
        let bootstrap = caller.uid == self.bootstrap_uid;

        let (email, role) = match record {
            Some(record) => (
                record.email,
                record.claims.map(|c| c.role).unwrap_or_default(),
            ),
            None if bootstrap => (None, Role::Guest),
            None => {
                warn!(uid = %caller.uid, "Caller has no identity record");
                return Err(FunctionError::PermissionDenied(
                    "caller has no identity record".to_owned(),
                ));
            }
        };

        if role != Role::SuperAdmin && !bootstrap {
            warn!(uid = %caller.uid, role = %role, "Caller is not a super-admin");
            return Err(FunctionError::PermissionDenied(
                "superadmin role required".to_owned(),
            ));
        }

        Ok(AuthorizationContext {
            caller: caller.uid.clone(),
            email,
            role,
            bootstrap,
        })
    }
}
