use axum::{routing::{get, post}, Router};
use crate::config::state::AppState;
use super::handler;

pub fn diagnostics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/debug_rest_completion/{conduct_id}", get(handler::debug_rest_completion))
        .route("/check_activity_history/{conduct_id}", get(handler::check_activity_history))
        .route("/force_rest_completion/{conduct_id}/{username}", post(handler::force_rest_completion))
        .route(
            "/force_work_completion_check/{conduct_id}/{username}",
            post(handler::force_work_completion_check),
        )
}
