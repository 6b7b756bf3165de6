use axum::{routing::{get, post}, Router};
use crate::config::state::AppState;
use super::handler;

pub fn cycle_routes() -> Router<AppState> {
    Router::new()
        .route("/set_zone", post(handler::set_zone))
        .route("/toggle_cut_off", post(handler::toggle_cut_off))
        .route("/stop_cycle", post(handler::stop_cycle))
        .route("/start_rest", post(handler::start_rest))
        .route("/clear_commands", post(handler::clear_commands))
        .route("/remove_user", post(handler::remove_user))
        .route("/get_user_state/{conduct_id}/{username}", get(handler::get_user_state))
}
