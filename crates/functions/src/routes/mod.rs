//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (database reachable)
//!
//! # Callable functions (super-admin only)
//! POST /functions/setUserRole      - Overwrite a user's role
//! POST /functions/deleteUser       - Delete a tenant and its owner
//! POST /functions/getUserRoleInfo  - Read a user's effective role
//!
//! # Public
//! POST /stores/{tenant}/orders     - Submit a customer order
//! GET  /subdomains/{subdomain}     - Subdomain availability
//!
//! # Onboarding (any verified caller)
//! POST /subdomains                 - Claim a subdomain for the caller
//! ```

pub mod functions;
pub mod orders;
pub mod subdomains;

use axum::{Json, Router, extract::rejection::JsonRejection};

use crate::error::FunctionError;
use crate::state::AppState;

/// Build the application router (without health checks or layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(functions::router())
        .merge(orders::router())
        .merge(subdomains::router())
}

/// Unwrap a JSON body, reporting a bad body as `INVALID_ARGUMENT`.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, FunctionError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| FunctionError::InvalidArgument(e.body_text()))
}
