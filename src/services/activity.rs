// Conduct activity log: writes, reads and history broadcasts

use chrono::NaiveDateTime;
use sqlx::PgPool;
use tracing::error;

use crate::config::state::AppState;
use crate::database::repository::activity::{self as activity_repo, NewActivity};
use crate::domain::zones::Zone;
use crate::models::{ActivityAction, ActivityLog, HistoryEntry};
use crate::realtime::{events::HistoryUpdate, ServerEvent};
use crate::utils::ApiResult;

/// Records an entry stamped with the conduct clock and pushes the refreshed
/// history to the conduct room. Never fails the caller; errors are logged.
pub async fn record(
    state: &AppState,
    conduct_id: i64,
    username: &str,
    action: ActivityAction,
    zone: Option<Zone>,
    details: Option<String>,
) {
    if let Err(e) = try_record(state, conduct_id, username, action, zone, details).await {
        error!(conduct_id, username, action = action.as_str(), "Failed to log activity: {}", e);
    }
}

async fn try_record(
    state: &AppState,
    conduct_id: i64,
    username: &str,
    action: ActivityAction,
    zone: Option<Zone>,
    details: Option<String>,
) -> ApiResult<()> {
    let pool: &PgPool = state.database.get_pool()?;
    let now: NaiveDateTime = state.clock.now();
    let zone: Option<&str> = zone.map(|z: Zone| z.as_str());

    let entry: NewActivity<'_> = NewActivity {
        conduct_id,
        username,
        action,
        zone,
        details: details.or_else(|| action.default_details(zone, now)),
        timestamp: now,
    };

    activity_repo::insert_log(pool, &entry).await?;
    broadcast_history(state, conduct_id, None).await
}

/// Formatted history, newest first. `limit = None` returns everything.
pub async fn history(state: &AppState, conduct_id: i64, limit: Option<i64>) -> ApiResult<Vec<HistoryEntry>> {
    let logs: Vec<ActivityLog> = raw_history(state, conduct_id, limit).await?;
    Ok(logs.into_iter().map(HistoryEntry::from).collect())
}

pub async fn raw_history(state: &AppState, conduct_id: i64, limit: Option<i64>) -> ApiResult<Vec<ActivityLog>> {
    let pool: &PgPool = state.database.get_pool()?;
    Ok(activity_repo::history(pool, conduct_id, limit).await?)
}

/// Sends the full history to the conduct room. A trigger also tags the event with the conduct id.
pub async fn broadcast_history(state: &AppState, conduct_id: i64, trigger: Option<&'static str>) -> ApiResult<()> {
    let history: Vec<HistoryEntry> = history(state, conduct_id, None).await?;

    let update: HistoryUpdate = HistoryUpdate {
        history,
        conduct_id: trigger.map(|_| conduct_id),
        trigger,
    };

    state
        .realtime
        .emit_to_conduct(conduct_id, ServerEvent::HistoryUpdate(update))
        .await;
    Ok(())
}
