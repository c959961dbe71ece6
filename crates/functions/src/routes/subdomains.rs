//! Subdomain availability and claiming for onboarding.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use menuboard_core::{Subdomain, Uid};

use crate::error::FunctionError;
use crate::middleware::RequireCaller;
use crate::state::AppState;

use super::json_body;

/// Build the subdomain router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subdomains", post(claim_subdomain))
        .route("/subdomains/{subdomain}", get(check_availability))
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub subdomain: Subdomain,
    pub available: bool,
    /// Store currently answering on this subdomain.
    pub tenant: Option<Uid>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimSubdomainRequest {
    #[serde(default)]
    pub subdomain: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimSubdomainResponse {
    pub success: bool,
    pub subdomain: Subdomain,
}

#[instrument(skip(state))]
async fn check_availability(
    State(state): State<AppState>,
    Path(subdomain): Path<String>,
) -> Result<Json<AvailabilityResponse>, FunctionError> {
    let subdomain = Subdomain::parse(&subdomain)?;
    let tenant = state.subdomains().lookup(&subdomain).await?;
    Ok(Json(AvailabilityResponse {
        subdomain,
        available: tenant.is_none(),
        tenant,
    }))
}

/// Claim a subdomain for the calling user.
#[instrument(skip_all)]
async fn claim_subdomain(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    payload: Result<Json<ClaimSubdomainRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClaimSubdomainResponse>), FunctionError> {
    let req = json_body(payload)?;
    let subdomain = Subdomain::parse(&req.subdomain)?;

    let entry = state.subdomains().claim(&subdomain, &caller.uid).await?;

    Ok((
        StatusCode::CREATED,
        Json(ClaimSubdomainResponse {
            success: true,
            subdomain: entry.subdomain,
        }),
    ))
}
