use axum::{
    Json,
    extract::{Path, State},
};
use d2y_sdk::objects::SlotResponse;

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `GET /slots/{slot_id}`: a single slot.
pub(super) async fn get_slot(
    State(state): State<AppState>,
    Authenticated(_caller): Authenticated,
    Path(slot_id): Path<String>,
) -> Result<Json<SlotResponse>, ApiError> {
    let slot = state.engine.get_slot(&slot_id).await?;
    Ok(Json(SlotResponse::from(&slot)))
}
