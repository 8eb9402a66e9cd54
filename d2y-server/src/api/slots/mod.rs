//! Slot API handlers.
//!
//! # Endpoints
//!
//! - `GET /slots?date=&type=&onlyAvailable=` – slots of one day and type
//! - `GET /slots/{slot_id}`                  – one slot with its remaining capacity
//!
//! Both require a credential but no particular role.

use axum::{Router, routing::get};

use crate::state::AppState;

mod get_slot;
mod list_slots;

/// Build the Slot API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots", get(list_slots::list_slots))
        .route("/slots/{slot_id}", get(get_slot::get_slot))
}
