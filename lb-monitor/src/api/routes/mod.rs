//! API route modules.

pub mod health;
pub mod monitor;

use axum::{Router, routing::get};

use crate::api::server::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/monitor", get(monitor::monitor))
        .route("/elb-stats", get(monitor::elb_stats))
        .nest("/health", health::router())
        .with_state(state)
}
