use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use d2y_core::entities::slot::SlotQuery;
use d2y_core::lifecycle::OrderError;
use d2y_sdk::objects::{ListSlotsQuery, SlotResponse};
use time::macros::format_description;

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `GET /slots`: slots of one day, ordered by start time.
///
/// `onlyAvailable` defaults to `true`.
pub(super) async fn list_slots(
    State(state): State<AppState>,
    Authenticated(_caller): Authenticated,
    query: Result<Query<ListSlotsQuery>, QueryRejection>,
) -> Result<Json<Vec<SlotResponse>>, ApiError> {
    let Query(query) = query?;
    let date = time::Date::parse(&query.date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| OrderError::InvalidInput("date must be YYYY-MM-DD".into()))?;

    let slots = state
        .engine
        .list_slots(&SlotQuery {
            date,
            slot_type: query.slot_type.into(),
            only_available: query.only_available,
        })
        .await?;
    Ok(Json(slots.iter().map(SlotResponse::from).collect()))
}
