use std::sync::Arc;

use crate::presence::{AmbientBaseline, PresenceRegistry};

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Listener presence registry, the single owner of membership state
    pub registry: Arc<PresenceRegistry>,
    /// Ambient padding blended into public counts
    pub ambient: AmbientBaseline,
}

impl AppState {
    pub fn new(registry: Arc<PresenceRegistry>, ambient: AmbientBaseline) -> Self {
        Self { registry, ambient }
    }
}
