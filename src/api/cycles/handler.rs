// Start of file: /src/api/cycles/handler.rs

// Work/rest cycle commands. Every command names its caller by `user_id`.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::config::state::AppState;
use crate::domain::cycle::CycleView;
use crate::domain::system_status::SystemStatus;
use crate::domain::zones::Zone;
use crate::services::cycles::{self, RestStarted, ZoneSet};
use crate::utils::{ApiError, HandlerResponse};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SetZoneRequest {
    pub user_id: i64,
    // ! Unknown zone names are rejected by the extractor with 422
    pub zone: Zone,
    pub target_user: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserCommand {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveUserRequest {
    pub user_id: i64,
    pub target_user: Option<String>,
}

// =============================================================================
// HANDLERS
// =============================================================================

#[instrument(skip(state, payload), fields(user_id = payload.user_id, zone = %payload.zone))]
pub async fn set_zone(
    State(state): State<AppState>,
    Json(payload): Json<SetZoneRequest>,
) -> Result<HandlerResponse, ApiError> {
    let set: ZoneSet = cycles::set_zone(
        &state,
        payload.user_id,
        payload.target_user.as_deref(),
        payload.zone,
        payload.location,
    )
    .await?;

    let message: String = format!("Work cycle started for {} in {} zone", set.user, set.zone);
    Ok(HandlerResponse::ok().data(json!(set)).message(message))
}

#[instrument(skip(state, payload), fields(user_id = payload.user_id))]
pub async fn toggle_cut_off(
    State(state): State<AppState>,
    Json(payload): Json<UserCommand>,
) -> Result<HandlerResponse, ApiError> {
    let status: SystemStatus = cycles::toggle_cut_off(&state, payload.user_id).await?;

    let message: &str = if status.cut_off {
        "Cut-off activated"
    } else {
        "Cut-off lifted, mandatory rest in effect"
    };

    Ok(HandlerResponse::ok().data(json!(status)).message(message))
}

#[instrument(skip(state, payload), fields(user_id = payload.user_id))]
pub async fn stop_cycle(
    State(state): State<AppState>,
    Json(payload): Json<UserCommand>,
) -> Result<HandlerResponse, ApiError> {
    cycles::stop_cycle(&state, payload.user_id).await?;
    Ok(HandlerResponse::ok().message("Cycle stopped"))
}

#[instrument(skip(state, payload), fields(user_id = payload.user_id))]
pub async fn start_rest(
    State(state): State<AppState>,
    Json(payload): Json<UserCommand>,
) -> Result<HandlerResponse, ApiError> {
    let rest: RestStarted = cycles::start_rest(&state, payload.user_id).await?;
    Ok(HandlerResponse::ok().data(json!(rest)).message("Rest cycle started"))
}

#[instrument(skip(state, payload), fields(user_id = payload.user_id))]
pub async fn clear_commands(
    State(state): State<AppState>,
    Json(payload): Json<UserCommand>,
) -> Result<HandlerResponse, ApiError> {
    let message: &str = cycles::clear_commands(&state, payload.user_id).await?;
    Ok(HandlerResponse::ok().message(message))
}

#[instrument(skip(state, payload), fields(user_id = payload.user_id, target = ?payload.target_user))]
pub async fn remove_user(
    State(state): State<AppState>,
    Json(payload): Json<RemoveUserRequest>,
) -> Result<HandlerResponse, ApiError> {
    let message: String = cycles::remove_user(&state, payload.user_id, payload.target_user.as_deref()).await?;
    Ok(HandlerResponse::ok().message(message))
}

#[instrument(skip(state))]
pub async fn get_user_state(
    State(state): State<AppState>,
    Path((conduct_id, username)): Path<(i64, String)>,
) -> Result<HandlerResponse, ApiError> {
    let view: CycleView = cycles::user_state(&state, conduct_id, &username).await?;
    Ok(HandlerResponse::ok().data(json!(view)))
}

// End of file: /src/api/cycles/handler.rs
