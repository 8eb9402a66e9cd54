//! HTTP and WebSocket surface.
//!
//! Every route except `/health` needs a bearer credential. Handlers are thin:
//! they extract, call the [`OrderEngine`](d2y_core::lifecycle::OrderEngine)
//! and convert to wire objects.

use axum::{Router, routing::get};

use crate::state::AppState;

mod error;
pub mod extractors;
mod orders;
mod slots;
mod ws;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use error::ApiError;

/// Build the API router (orders, slots and the live channel).
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(orders::router())
        .merge(slots::router())
        .route("/ws", get(ws::live_channel))
}
