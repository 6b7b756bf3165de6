use axum::{routing::{get, post}, Router};
use crate::config::state::AppState;
use super::handler;

pub fn organisation_routes() -> Router<AppState> {
    Router::new()
        .route("/create_conduct", post(handler::create_conduct))
        .route("/view_conducts", post(handler::view_conducts))
        .route("/battalion_overview/{battalion_id}", get(handler::battalion_overview))
        .route("/company_conducts/{company_id}", get(handler::company_conducts))
        .route("/delete_conducts/{battalion_id}", post(handler::delete_conducts))
        .route("/change_password", post(handler::change_password))
}
