pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::attribution::handlers;
use crate::seed;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Attribution API
        .route(
            "/api/v1/campaigns/:campaign_id/attribution/compute",
            post(handlers::handle_compute),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/attribution",
            get(handlers::handle_history),
        )
        // Demo data
        .route("/api/v1/seed/sample", post(seed::handle_seed_sample))
        .with_state(state)
}
