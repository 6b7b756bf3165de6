// Start of file: /src/api/diagnostics/handler.rs

use axum::extract::{Path, State};
use serde_json::json;
use tracing::instrument;

use crate::config::state::AppState;
use crate::services::diagnostics::{self, ActivityReport, ForcedRest, RestCompletionReport};
use crate::utils::{ApiError, HandlerResponse};

#[instrument(skip(state))]
pub async fn debug_rest_completion(
    State(state): State<AppState>,
    Path(conduct_id): Path<i64>,
) -> Result<HandlerResponse, ApiError> {
    let report: RestCompletionReport = diagnostics::debug_rest_completion(&state, conduct_id).await?;
    Ok(HandlerResponse::ok().data(json!(report)))
}

#[instrument(skip(state))]
pub async fn check_activity_history(
    State(state): State<AppState>,
    Path(conduct_id): Path<i64>,
) -> Result<HandlerResponse, ApiError> {
    let report: ActivityReport = diagnostics::activity_history(&state, conduct_id).await?;
    Ok(HandlerResponse::ok().data(json!(report)))
}

#[instrument(skip(state))]
pub async fn force_rest_completion(
    State(state): State<AppState>,
    Path((conduct_id, username)): Path<(i64, String)>,
) -> Result<HandlerResponse, ApiError> {
    let forced: ForcedRest = diagnostics::force_rest_completion(&state, conduct_id, &username).await?;

    Ok(HandlerResponse::ok()
        .data(json!({
            "previous_zone": forced.previous_zone,
            "new_status": forced.new_status,
        }))
        .message(forced.message))
}

#[instrument(skip(state))]
pub async fn force_work_completion_check(
    State(state): State<AppState>,
    Path((conduct_id, username)): Path<(i64, String)>,
) -> Result<HandlerResponse, ApiError> {
    let (sent, message) = diagnostics::force_work_completion_check(&state, conduct_id, &username).await?;

    Ok(HandlerResponse::ok()
        .data(json!({ "notification_sent": sent }))
        .message(message))
}

// End of file: /src/api/diagnostics/handler.rs
