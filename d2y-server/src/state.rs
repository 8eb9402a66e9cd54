//! Application state shared across all request handlers.

use crate::credentials::CredentialStore;
use d2y_core::events::FanoutHub;
use d2y_core::lifecycle::OrderEngine;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// The order lifecycle engine; holds the store and the reloadable
    /// order settings.
    pub engine: OrderEngine,
    /// Credential digests (can be reloaded via SIGHUP).
    pub identities: Arc<CredentialStore>,
}

impl AppState {
    pub fn new(engine: OrderEngine, identities: Arc<CredentialStore>) -> Self {
        Self { engine, identities }
    }

    /// The live channel registry the engine publishes to.
    pub fn hub(&self) -> &FanoutHub {
        self.engine.hub()
    }
}
