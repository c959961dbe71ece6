//! Roles and the custom claims attached to identity records.

use serde::{Deserialize, Serialize};

use super::subdomain::Subdomain;

/// Errors that can occur when parsing a [`Role`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The string is not one of the known roles.
    #[error("invalid role: {0:?} (expected guest, host or superadmin)")]
    Unknown(String),
}

/// Errors that can occur when building [`CustomClaims`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    /// A `host` claim set was requested without a subdomain.
    #[error("a subdomain is required for the host role")]
    HostRequiresSubdomain,
}

/// Authorization role carried in a user's custom claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// No privileges. Every user without claims is treated as a guest.
    #[default]
    Guest,
    /// Manages exactly one store, identified by the claim's subdomain.
    Host,
    /// Manages every store and every user's role.
    #[serde(rename = "superadmin")]
    SuperAdmin,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Host => "host",
            Self::SuperAdmin => "superadmin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Self::Guest),
            "host" => Ok(Self::Host),
            "superadmin" => Ok(Self::SuperAdmin),
            _ => Err(RoleError::Unknown(s.to_owned())),
        }
    }
}

/// The full custom-claim set stored on an identity record.
///
/// Invariant: `role == Host` exactly when `subdomain` is present. Build
/// values with [`CustomClaims::for_role`]; writes replace the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomClaims {
    /// The user's role.
    #[serde(default)]
    pub role: Role,
    /// The store a host manages; `None` for every other role.
    #[serde(default)]
    pub subdomain: Option<Subdomain>,
}

impl CustomClaims {
    /// Build the claim set for `role`.
    ///
    /// A subdomain passed with any role other than `host` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::HostRequiresSubdomain`] for a host without subdomain.
    pub fn for_role(role: Role, subdomain: Option<Subdomain>) -> Result<Self, ClaimsError> {
        match role {
            Role::Host => {
                let subdomain = subdomain.ok_or(ClaimsError::HostRequiresSubdomain)?;
                Ok(Self {
                    role,
                    subdomain: Some(subdomain),
                })
            }
            Role::Guest | Role::SuperAdmin => Ok(Self {
                role,
                subdomain: None,
            }),
        }
    }
}

/// The effective `{role, subdomain}` pair reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoleInfo {
    /// Effective role (`guest` when no claims were ever set).
    pub role: Role,
    /// Effective subdomain, serialized as `null` when absent.
    pub subdomain: Option<Subdomain>,
}

impl RoleInfo {
    /// Derive the effective role from a user's claims, defaulting to guest.
    #[must_use]
    pub fn from_claims(claims: Option<&CustomClaims>) -> Self {
        claims.map_or_else(Self::default, |c| Self {
            role: c.role,
            subdomain: c.subdomain.clone(),
        })
    }
}
