//! Wire objects shared between the D2Y order service and its clients.
//!
//! Everything in here is plain serde data: request bodies, response shapes,
//! the live channel protocol and the machine-readable error codes.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod objects;
