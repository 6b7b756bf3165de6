// Start of file: /src/api/system/handler.rs

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::config::state::AppState;
use crate::domain::system_status::SystemStatus;
use crate::domain::zones::Zone;
use crate::utils::HandlerResponse;

#[derive(Debug, Deserialize)]
pub struct SystemStatusQuery {
    pub conduct_id: Option<i64>,
}

/// Landing endpoint; `_body` makes body-size limits apply here too
#[instrument(skip(state, _body))]
pub async fn banner(State(state): State<AppState>, _body: Bytes) -> HandlerResponse {
    HandlerResponse::ok()
        .data(json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "environment": &*state.environment.environment,
            "zones": Zone::table(),
        }))
        .message("Thermopal heat-stress cycle tracker")
}

/// Health check endpoint that verifies database connectivity
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> HandlerResponse {
    let instance_id: String = get_instance_identifier();

    match state.database.ping().await {
        Ok(()) => HandlerResponse::ok()
            .data(json!({ "database": "connected", "instance_id": instance_id }))
            .message("Database connection healthy"),
        Err(e) => {
            warn!("Health check failed: {:#}", e);
            HandlerResponse::new(StatusCode::SERVICE_UNAVAILABLE)
                .data(json!({ "database": "disconnected", "instance_id": instance_id }))
                .message("Database connection failed")
        }
    }
}

/// Identifies this instance: container id, then hostname, then process id
fn get_instance_identifier() -> String {
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        if hostname.len() > 8 && hostname.chars().all(|c: char| c.is_ascii_hexdigit() || c == '-') {
            let short: &str = hostname.get(..12).unwrap_or(hostname.as_str());
            return format!("container_{short}");
        }
        return format!("host_{hostname}");
    }

    if let Ok(hostname) = hostname::get() {
        if let Some(hostname_str) = hostname.to_str() {
            return format!("host_{hostname_str}");
        }
    }

    format!("process_{}", std::process::id())
}

/// UTC epoch seconds for client clock sync
#[instrument]
pub async fn get_server_time() -> HandlerResponse {
    let now: DateTime<Utc> = Utc::now();
    let timestamp: f64 = now.timestamp_micros() as f64 / 1_000_000.0;

    HandlerResponse::ok().data(json!({ "timestamp": timestamp }))
}

#[instrument(skip(state))]
pub async fn get_system_status(
    State(state): State<AppState>,
    Query(query): Query<SystemStatusQuery>,
) -> HandlerResponse {
    let status: SystemStatus = match query.conduct_id {
        Some(conduct_id) => state.statuses.get(conduct_id).await,
        None => SystemStatus::default(),
    };

    info!(conduct_id = ?query.conduct_id, cut_off = status.cut_off, "System status requested");
    HandlerResponse::ok().data(json!(status))
}

// End of file: /src/api/system/handler.rs
