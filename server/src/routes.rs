use axum::{routing, Router};

use crate::channels::catalog;
use crate::presence::routes as listeners;
use crate::state::AppState;

/// Build the full axum Router with all routes.
pub fn build_router(state: AppState) -> Router {
    let listener_routes = Router::new()
        .route("/api/listeners", routing::get(listeners::query_all))
        .route("/api/listeners", routing::post(listeners::heartbeat))
        .route("/api/listeners", routing::delete(listeners::disconnect))
        .route("/api/listeners/real", routing::get(listeners::query_real))
        .route(
            "/api/listeners/disconnect",
            routing::post(listeners::disconnect),
        );

    let channel_routes =
        Router::new().route("/api/channels", routing::get(catalog::list_channels));

    // Health check
    let health = Router::new().route("/health", routing::get(health_check));

    Router::new()
        .merge(listener_routes)
        .merge(channel_routes)
        .merge(health)
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
