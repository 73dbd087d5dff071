pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::form::handlers;
use crate::state::AppState;
use crate::submission::handlers::handle_submit;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/catalog", get(handlers::handle_get_catalog))
        // Questionnaire sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/answers/:field_id",
            put(handlers::handle_set_answer),
        )
        .route("/api/v1/sessions/:id/back", post(handlers::handle_back))
        .route("/api/v1/sessions/:id/next", post(handlers::handle_next))
        // Submission
        .route("/api/v1/sessions/:id/submit", post(handle_submit))
        .with_state(state)
}
