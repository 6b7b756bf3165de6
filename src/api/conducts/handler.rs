// Start of file: /src/api/conducts/handler.rs

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::config::state::AppState;
use crate::models::{Conduct, HistoryEntry};
use crate::services::activity;
use crate::services::conducts::{self, DashboardView, MonitorView, SetupResult};
use crate::utils::{ApiError, HandlerResponse};

#[derive(Debug, Deserialize)]
pub struct JoinConductRequest {
    pub pin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserSetupRequest {
    pub user_name: Option<String>,
    pub role: Option<String>,
    pub conducting_body_password: Option<String>,
}

#[instrument(skip(state, payload))]
pub async fn join_conduct(
    State(state): State<AppState>,
    Json(payload): Json<JoinConductRequest>,
) -> Result<HandlerResponse, ApiError> {
    let conduct: Conduct = conducts::join_conduct(&state, payload.pin.as_deref()).await?;

    Ok(HandlerResponse::ok()
        .data(json!({
            "conduct_id": conduct.id,
            "conduct_name": conduct.name,
            "redirect": format!("/user_setup/{}", conduct.id),
        }))
        .message(format!("Joined conduct: {}", conduct.name)))
}

/// Registers the caller in the conduct and hands back a session token
#[instrument(skip(state, payload), fields(user_name = ?payload.user_name, role = ?payload.role))]
pub async fn user_setup(
    State(state): State<AppState>,
    Path(conduct_id): Path<i64>,
    Json(payload): Json<UserSetupRequest>,
) -> Result<HandlerResponse, ApiError> {
    let setup: SetupResult = conducts::user_setup(
        &state,
        conduct_id,
        payload.user_name.as_deref(),
        payload.role.as_deref(),
        payload.conducting_body_password.as_deref(),
    )
    .await?;

    let redirect: String = format!("/{}/{}", setup.interface, setup.user_id);

    Ok(HandlerResponse::ok()
        .data(json!({
            "user_id": setup.user_id,
            "conduct_id": setup.conduct_id,
            "role": setup.role,
            "session_token": setup.session_token,
            "interface": setup.interface,
            "redirect": redirect,
        }))
        .message("User setup complete"))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<HandlerResponse, ApiError> {
    let view: DashboardView = conducts::dashboard(&state, user_id).await?;
    Ok(HandlerResponse::ok().data(json!(view)))
}

#[instrument(skip(state))]
pub async fn monitor(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<HandlerResponse, ApiError> {
    let view: MonitorView = conducts::monitor(&state, user_id).await?;
    Ok(HandlerResponse::ok().data(json!(view)))
}

#[instrument(skip(state))]
pub async fn get_conduct_history(
    State(state): State<AppState>,
    Path(conduct_id): Path<i64>,
) -> Result<HandlerResponse, ApiError> {
    let history: Vec<HistoryEntry> = activity::history(&state, conduct_id, None).await?;

    Ok(HandlerResponse::ok().data(json!({
        "conduct_id": conduct_id,
        "history": history,
    })))
}

// End of file: /src/api/conducts/handler.rs
