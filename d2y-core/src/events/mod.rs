//! Live event fan-out.
//!
//! # Event Flow
//!
//! 1. A lifecycle operation commits its transaction.
//! 2. The engine builds one [`LiveEvent`](d2y_sdk::objects::LiveEvent) per
//!    notification and publishes it to the order's audience (admin cohort,
//!    owning merchant, order watchers).
//! 3. Each WebSocket session drains its [`Subscription`] and forwards frames.
//!
//! Events never reach the hub for a transaction that rolled back.

pub mod hub;

pub use hub::{DEFAULT_SUBSCRIBER_BUFFER, FanoutHub, Group, Subscription};
