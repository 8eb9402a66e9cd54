use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use d2y_sdk::objects::{ListOrdersQuery, OrderPageResponse};

use crate::api::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `GET /orders`: list the orders visible to the caller, newest first.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<OrderPageResponse>, ApiError> {
    let Query(query) = query?;
    let page = state
        .engine
        .list_orders(&caller, query.q, query.limit, query.offset)
        .await?;
    Ok(Json(OrderPageResponse::from(&page)))
}
