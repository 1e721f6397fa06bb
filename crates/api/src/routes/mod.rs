//! API routes

pub mod cron;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check routes (at root level for infrastructure monitoring)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Scheduler-triggered jobs
        .route(
            "/api/cron/recurring-billing",
            post(cron::run_recurring_billing),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
