pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/v1/staffing/normalize",
            post(handlers::handle_normalize),
        )
        .route("/api/v1/osint/analyze", post(handlers::handle_osint))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .with_state(state)
}
