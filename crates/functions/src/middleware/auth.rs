//! Bearer-token extractors.
//!
//! A missing or invalid token never rejects the request on its own; it just
//! leaves no [`VerifiedCaller`], and the guarded operation decides.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::error::{FunctionError, set_sentry_user};
use crate::state::AppState;
use crate::token::VerifiedCaller;

/// The verified caller, if the request carried a valid identity token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalCaller(caller): OptionalCaller) -> impl IntoResponse {
///     match caller {
///         Some(c) => format!("Hello, {}!", c.uid),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalCaller(pub Option<VerifiedCaller>);

impl FromRequestParts<AppState> for OptionalCaller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };

        match state.tokens().verify(token) {
            Ok(caller) => {
                set_sentry_user(caller.uid.as_str(), None);
                Ok(Self(Some(caller)))
            }
            Err(e) => {
                debug!(error = %e, "Ignoring invalid identity token");
                Ok(Self(None))
            }
        }
    }
}

/// Extractor that requires a verified caller.
///
/// Rejects with `UNAUTHENTICATED` when no valid token is present.
pub struct RequireCaller(pub VerifiedCaller);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = FunctionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalCaller(caller) = match OptionalCaller::from_request_parts(parts, state).await {
            Ok(caller) => caller,
            Err(never) => match never {},
        };
        caller.map(Self).ok_or_else(|| {
            FunctionError::Unauthenticated("a verified identity token is required".to_owned())
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
