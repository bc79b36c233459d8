use std::sync::Arc;

use fileway_core::ConduitSet;

use crate::auth::SecretStore;

/// Shared state threaded through every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub conduits: Arc<ConduitSet>,
    pub auth: Arc<SecretStore>,
}
