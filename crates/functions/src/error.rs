//! Unified error handling for callable functions.
//!
//! Every guarded operation fails with one of four kinds, mirroring the
//! callable-function error codes clients already understand:
//! `UNAUTHENTICATED`, `PERMISSION_DENIED`, `INVALID_ARGUMENT`, `INTERNAL`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use menuboard_core::{ClaimsError, EmailError, PriceError, RoleError, SubdomainError};

use crate::store::{PathError, StoreError};

/// Error returned by every callable operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FunctionError {
    /// No verified caller identity was presented.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller lacks the required role, or targeted a protected principal.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A required field is missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A downstream store failed; carries the store's message unmodified.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FunctionError {
    /// Wire code for the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// The message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated(m)
            | Self::PermissionDenied(m)
            | Self::InvalidArgument(m)
            | Self::Internal(m) => m,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for FunctionError {
    fn from(err: StoreError) -> Self {
        match err {
            // A path built from caller input is a caller mistake, not a store failure.
            StoreError::Path(e) => Self::InvalidArgument(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<PathError> for FunctionError {
    fn from(err: PathError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<RoleError> for FunctionError {
    fn from(err: RoleError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<SubdomainError> for FunctionError {
    fn from(err: SubdomainError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<ClaimsError> for FunctionError {
    fn from(err: ClaimsError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<EmailError> for FunctionError {
    fn from(err: EmailError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<PriceError> for FunctionError {
    fn from(err: PriceError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    status: &'static str,
    message: &'a str,
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Function request error"
            );
        }

        let body = ErrorBody {
            error: ErrorDetail {
                status: self.code(),
                message: self.message(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Set the Sentry user context from a verified caller.
pub fn set_sentry_user(uid: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(uid.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
