use axum::{routing::get, Router};
use crate::config::state::AppState;
use super::handler;

pub fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::banner))
        .route("/health", get(handler::health_check))
        .route("/get_server_time", get(handler::get_server_time))
        .route("/get_system_status", get(handler::get_system_status))
}
