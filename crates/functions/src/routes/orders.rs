//! Public order submission.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;
use tracing::instrument;

use menuboard_core::{OrderId, TenantId};

use crate::error::FunctionError;
use crate::services::OrderInput;
use crate::state::AppState;

use super::json_body;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stores/{tenant}/orders", post(submit_order))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
}

#[instrument(skip(state, payload))]
async fn submit_order(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitOrderResponse>), FunctionError> {
    let input = json_body(payload)?;
    let order_id = state
        .orders()
        .submit(&TenantId::new(tenant), input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitOrderResponse {
            success: true,
            order_id,
        }),
    ))
}
