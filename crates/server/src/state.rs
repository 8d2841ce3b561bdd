//! Shared application state injected into every handler.

use std::sync::Arc;

use deploy::{DeploymentStore, IdentityVerifier};
use publisher::Publisher;

/// Handles to the ports and the publish orchestrator.
///
/// Everything is behind `Arc` so the state clones cheaply per request, and
/// behind traits so tests can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    /// Bearer-token verification.
    pub identity: Arc<dyn IdentityVerifier>,
    /// Deployment metadata rows.
    pub store: Arc<dyn DeploymentStore>,
    /// The repackage-and-publish pipeline.
    pub publisher: Arc<Publisher>,
}

impl AppState {
    /// Bundles the injected dependencies into one state value.
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        store: Arc<dyn DeploymentStore>,
        publisher: Arc<Publisher>,
    ) -> Self {
        Self {
            identity,
            store,
            publisher,
        }
    }
}
