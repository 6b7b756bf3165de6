use axum::{routing::{get, post}, Router};
use crate::config::state::AppState;
use super::handler;

pub fn conduct_routes() -> Router<AppState> {
    Router::new()
        .route("/join_conduct", post(handler::join_conduct))
        .route("/user_setup/{conduct_id}", post(handler::user_setup))
        .route("/dashboard/{user_id}", get(handler::dashboard))
        .route("/monitor/{user_id}", get(handler::monitor))
        .route("/get_conduct_history/{conduct_id}", get(handler::get_conduct_history))
}
