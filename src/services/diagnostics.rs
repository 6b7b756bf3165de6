// Operator tooling for inspecting and nudging cycle completion

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::state::AppState;
use crate::database::repository::users as user_repo;
use crate::domain::clock::{clock_string, clock_time};
use crate::domain::cycle::UserStatus;
use crate::domain::zones::Zone;
use crate::models::{ActivityLog, User};
use crate::services::{activity, cycles, users};
use crate::utils::{ApiError, ApiResult};

const RECENT_LOGS: i64 = 10;

#[derive(Debug, Serialize)]
pub struct RestingUserReport {
    pub name: String,
    pub zone: Option<Zone>,
    #[serde(serialize_with = "clock_string::serialize")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(serialize_with = "clock_string::serialize")]
    pub end_time: Option<NaiveDateTime>,
    pub should_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_until_completion: Option<String>,
}

/// Log line with its id and an ISO-8601 timestamp.
#[derive(Debug, Serialize)]
pub struct LogReport {
    pub id: i64,
    pub timestamp: String,
    pub username: String,
    pub action: String,
    pub zone: Option<String>,
    pub details: Option<String>,
}

impl From<ActivityLog> for LogReport {
    fn from(log: ActivityLog) -> Self {
        Self {
            id: log.id,
            timestamp: log.timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            username: log.username,
            action: log.action,
            zone: log.zone,
            details: log.details,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RestCompletionReport {
    pub current_time: String,
    pub resting_users: Vec<RestingUserReport>,
    pub activity_logs: Vec<LogReport>,
}

#[derive(Debug, Serialize)]
pub struct ActivityReport {
    pub conduct_id: i64,
    pub total_logs: usize,
    pub recent_activity: Vec<LogReport>,
}

#[derive(Debug, Serialize)]
pub struct ForcedRest {
    pub message: String,
    pub previous_zone: Option<Zone>,
    pub new_status: UserStatus,
}

pub async fn debug_rest_completion(state: &AppState, conduct_id: i64) -> ApiResult<RestCompletionReport> {
    let pool: &PgPool = state.database.get_pool()?;
    let now: NaiveDateTime = state.clock.now();

    let resting_users: Vec<RestingUserReport> = user_repo::users_in_conduct(pool, conduct_id)
        .await?
        .into_iter()
        .filter(|u: &User| u.cycle.status == UserStatus::Resting)
        .map(|u: User| resting_report(u, now))
        .collect();

    let activity_logs: Vec<LogReport> = activity::raw_history(state, conduct_id, Some(RECENT_LOGS))
        .await?
        .into_iter()
        .map(LogReport::from)
        .collect();

    Ok(RestCompletionReport {
        current_time: clock_time(now),
        resting_users,
        activity_logs,
    })
}

fn resting_report(user: User, now: NaiveDateTime) -> RestingUserReport {
    let (should_complete, time_until_completion) = match user.cycle.end_time {
        Some(end) if now >= end => (true, Some("OVERDUE".to_string())),
        Some(end) => (false, Some(format_remaining(end - now))),
        None => (false, None),
    };

    RestingUserReport {
        name: user.name,
        zone: user.cycle.zone,
        start_time: user.cycle.start_time,
        end_time: user.cycle.end_time,
        should_complete,
        time_until_completion,
    }
}

// * H:MM:SS
fn format_remaining(remaining: Duration) -> String {
    let total: i64 = remaining.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

pub async fn activity_history(state: &AppState, conduct_id: i64) -> ApiResult<ActivityReport> {
    let recent_activity: Vec<LogReport> = activity::raw_history(state, conduct_id, None)
        .await?
        .into_iter()
        .map(LogReport::from)
        .collect();

    Ok(ActivityReport {
        conduct_id,
        total_logs: recent_activity.len(),
        recent_activity,
    })
}

/// Completes a resting participant's rest right now.
pub async fn force_rest_completion(state: &AppState, conduct_id: i64, username: &str) -> ApiResult<ForcedRest> {
    let user: User = users::require_by_name(state, conduct_id, username).await?;

    if user.cycle.status != UserStatus::Resting {
        return Err(ApiError::bad_request(format!(
            "User {} is not in resting state. Current status: {}",
            username, user.cycle.status
        )));
    }

    let now: NaiveDateTime = state.clock.now();
    let previous_zone: Option<Zone> = user.cycle.zone;
    let details: String = format!("Rest cycle completed manually at {}", clock_time(now));

    warn!(conduct_id, "Forcing rest completion for '{}'", username);
    let user: User = cycles::complete_rest(state, user, now, details).await?;

    Ok(ForcedRest {
        message: format!("Rest completion forced for {username}"),
        previous_zone,
        new_status: user.cycle.status,
    })
}

/// Re-sends the work-complete notifications when the participant is still
/// waiting to start rest. Returns whether anything was sent.
pub async fn force_work_completion_check(state: &AppState, conduct_id: i64, username: &str) -> ApiResult<(bool, &'static str)> {
    let user: User = users::require_by_name(state, conduct_id, username).await?;

    if user.cycle.awaiting_rest() && user.cycle.zone.is_some() {
        cycles::notify_work_complete(state, &user).await;
        info!(conduct_id, "Work completion notification re-sent to '{}'", username);
        return Ok((true, "Work completion notification sent"));
    }

    Ok((false, "No pending work completion found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cycle::{CycleState, Role};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn resting(end: NaiveDateTime) -> User {
        let mut cycle: CycleState = CycleState::new(UserStatus::Idle);
        cycle.start_work(Zone::Red, at(9, 0, 0));
        cycle.start_rest(end - Duration::minutes(30));

        User {
            id: 4,
            conduct_id: 1,
            name: "bravo".into(),
            role: Role::Trainer,
            location: None,
            cycle,
        }
    }

    #[test]
    fn remaining_time_reads_like_a_clock() {
        assert_eq!(format_remaining(Duration::seconds(3725)), "1:02:05");
        assert_eq!(format_remaining(Duration::seconds(59)), "0:00:59");
    }

    #[test]
    fn rest_in_progress_reports_time_left() {
        let report: RestingUserReport = resting_report(resting(at(10, 0, 0)), at(9, 45, 30));
        assert!(!report.should_complete);
        assert_eq!(report.time_until_completion.as_deref(), Some("0:14:30"));
    }

    #[test]
    fn rest_past_its_end_is_overdue() {
        let report: RestingUserReport = resting_report(resting(at(10, 0, 0)), at(10, 0, 0));
        assert!(report.should_complete);
        assert_eq!(report.time_until_completion.as_deref(), Some("OVERDUE"));
    }

    #[test]
    fn log_report_uses_iso_timestamps() {
        let report: LogReport = LogReport::from(ActivityLog {
            id: 7,
            conduct_id: 1,
            username: "bravo".into(),
            action: "start_rest".into(),
            zone: Some("red".into()),
            details: None,
            timestamp: at(14, 5, 9),
        });
        assert_eq!(report.timestamp, "2025-06-01T14:05:09");
        assert_eq!(report.id, 7);
    }
}
