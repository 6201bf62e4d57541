pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route("/api/v1/session/input", put(handlers::handle_set_input))
        .route(
            "/api/v1/session/parameters",
            put(handlers::handle_set_parameters),
        )
        .route("/api/v1/session/scan", post(handlers::handle_scan))
        .route("/api/v1/session/refine", post(handlers::handle_refine))
        .route(
            "/api/v1/session/variation",
            put(handlers::handle_select_variation),
        )
        .route("/api/v1/session/reset", post(handlers::handle_reset))
        .route(
            "/api/v1/session/drawers/:drawer",
            put(handlers::handle_set_drawer),
        )
        .route("/api/v1/session/panel", put(handlers::handle_set_panel))
        .route(
            "/api/v1/session/error",
            axum::routing::delete(handlers::handle_dismiss_error),
        )
        .with_state(state)
}
