//! Callable functions: role management and tenant deletion.
//!
//! Every handler authorizes first and only then looks at the body, so an
//! unauthorized caller learns nothing about input validation.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use menuboard_core::{Email, Role, RoleInfo, Subdomain};

use crate::error::{FunctionError, set_sentry_user};
use crate::middleware::OptionalCaller;
use crate::services::AuthorizationContext;
use crate::state::AppState;
use crate::token::VerifiedCaller;

use super::json_body;

/// Build the callable functions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/functions/setUserRole", post(set_user_role))
        .route("/functions/deleteUser", post(delete_user))
        .route("/functions/getUserRoleInfo", post(get_user_role_info))
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SetUserRoleRequest {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub subdomain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetUserRoleResponse {
    pub success: bool,
    pub message: String,
    pub role: Role,
    pub subdomain: Option<Subdomain>,
}

/// Body of `deleteUser` and `getUserRoleInfo`.
#[derive(Debug, Deserialize)]
pub struct UidRequest {
    #[serde(default)]
    pub uid: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Run the super-admin guard and tag the Sentry scope with the caller's
/// current identity record.
async fn authorize(
    state: &AppState,
    caller: Option<&VerifiedCaller>,
) -> Result<AuthorizationContext, FunctionError> {
    let ctx = state.guard().authorize(caller).await?;
    set_sentry_user(ctx.caller().as_str(), ctx.email().map(Email::as_str));
    Ok(ctx)
}

#[instrument(skip_all)]
async fn set_user_role(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    payload: Result<Json<SetUserRoleRequest>, JsonRejection>,
) -> Result<Json<SetUserRoleResponse>, FunctionError> {
    let ctx = authorize(&state, caller.as_ref()).await?;
    let req = json_body(payload)?;

    let info = state
        .roles()
        .set_role(&ctx, &req.uid, &req.role, req.subdomain.as_deref())
        .await?;

    Ok(Json(SetUserRoleResponse {
        success: true,
        message: format!("Role {} assigned to user {}", info.role, req.uid.trim()),
        role: info.role,
        subdomain: info.subdomain,
    }))
}

#[instrument(skip_all)]
async fn delete_user(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    payload: Result<Json<UidRequest>, JsonRejection>,
) -> Result<Json<DeleteUserResponse>, FunctionError> {
    let ctx = authorize(&state, caller.as_ref()).await?;
    let req = json_body(payload)?;

    let report = state.cascade().delete_tenant_user(&ctx, &req.uid).await?;

    Ok(Json(DeleteUserResponse {
        success: true,
        message: format!(
            "User {} and {} documents deleted",
            report.uid,
            report.total()
        ),
    }))
}

#[instrument(skip_all)]
async fn get_user_role_info(
    State(state): State<AppState>,
    OptionalCaller(caller): OptionalCaller,
    payload: Result<Json<UidRequest>, JsonRejection>,
) -> Result<Json<RoleInfo>, FunctionError> {
    let ctx = authorize(&state, caller.as_ref()).await?;
    let req = json_body(payload)?;

    let info = state.roles().role_info(&ctx, &req.uid).await?;
    Ok(Json(info))
}
