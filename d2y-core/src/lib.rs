#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod access;
pub mod entities;
pub mod events;
pub mod framework;
pub mod identity;
pub mod ledger;
pub mod lifecycle;
pub mod store;
