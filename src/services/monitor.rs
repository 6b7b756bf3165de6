// Background task that finishes due cycles and retires idle conducts

use chrono::{Duration, NaiveDateTime};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{error, info};

use crate::config::state::AppState;
use crate::database::repository::{conducts as conduct_repo, users as user_repo};
use crate::domain::clock::{clock_time, DATE_TIME_FORMAT};
use crate::domain::cycle::UserStatus;
use crate::models::{ActivityAction, Conduct, ConductStatus, User, SYSTEM_USER};
use crate::services::{activity, cycles, users};
use crate::utils::ApiResult;

/// Starts the monitor loop. The caller aborts the handle on shutdown.
pub fn spawn(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut cycle_tick: Interval =
            interval(std::time::Duration::from_secs(state.environment.cycle_check_interval_seconds));
        let mut conduct_tick: Interval =
            interval(std::time::Duration::from_secs(state.environment.conduct_check_interval_seconds));
        cycle_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        conduct_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            cycle_seconds = state.environment.cycle_check_interval_seconds,
            conduct_seconds = state.environment.conduct_check_interval_seconds,
            "Cycle monitor started"
        );

        loop {
            tokio::select! {
                _ = cycle_tick.tick() => {
                    if let Err(e) = check_user_cycles(&state).await {
                        error!("Cycle check failed: {}", e);
                    }
                }
                _ = conduct_tick.tick() => {
                    if let Err(e) = check_conduct_activity(&state).await {
                        error!("Conduct activity check failed: {}", e);
                    }
                }
            }
        }
    })
}

/// One pass over every working and resting participant.
pub async fn check_user_cycles(state: &AppState) -> ApiResult<()> {
    let pool: &PgPool = state.database.get_pool()?;
    let now: NaiveDateTime = state.clock.now();

    for user in user_repo::users_with_status(pool, UserStatus::Working).await? {
        if !cycles::work_due(&user, now) {
            continue;
        }
        let (id, name) = (user.id, user.name.clone());
        if let Err(e) = finish_work(state, user, now).await {
            error!(user_id = id, "Failed to complete work cycle for '{}': {}", name, e);
        }
    }

    for user in user_repo::users_with_status(pool, UserStatus::Resting).await? {
        let Some(end) = user.cycle.end_time.filter(|end: &NaiveDateTime| *end <= now) else {
            continue;
        };
        let (id, name) = (user.id, user.name.clone());
        let details: String = format!("Rest cycle completed automatically at {}", clock_time(end));

        if let Err(e) = cycles::complete_rest(state, user, end, details).await {
            error!(user_id = id, "Failed to complete rest cycle for '{}': {}", name, e);
        }
    }

    Ok(())
}

async fn finish_work(state: &AppState, mut user: User, now: NaiveDateTime) -> ApiResult<()> {
    user.cycle.complete_work();
    users::save(state, &user).await?;

    activity::record(
        state,
        user.conduct_id,
        &user.name,
        ActivityAction::CompletedWork,
        user.cycle.zone,
        Some(format!("Work cycle completed automatically at {}", clock_time(now))),
    )
    .await;

    users::broadcast(state, &user).await;
    cycles::notify_work_complete(state, &user).await;

    info!(conduct_id = user.conduct_id, "Work cycle completed for '{}'", user.name);
    Ok(())
}

/// Deactivates active conducts idle past the inactivity window with nobody on a cycle.
pub async fn check_conduct_activity(state: &AppState) -> ApiResult<()> {
    let pool: &PgPool = state.database.get_pool()?;
    let now: NaiveDateTime = state.clock.now();
    let hours: i64 = state.environment.conduct_inactivity_hours;
    let cutoff: NaiveDateTime = now - Duration::hours(hours);

    let stale: Vec<Conduct> = conduct_repo::stale_active_conducts(pool, cutoff).await?;

    for conduct in stale {
        conduct_repo::set_status(pool, conduct.id, ConductStatus::Inactive, None).await?;

        activity::record(
            state,
            conduct.id,
            SYSTEM_USER,
            ActivityAction::ConductDeactivated,
            None,
            Some(format!(
                "Conduct automatically deactivated after {hours} hours with no active users at {}",
                now.format(DATE_TIME_FORMAT)
            )),
        )
        .await;

        info!(conduct_id = conduct.id, pin = %conduct.pin, "Conduct '{}' deactivated after {} hours idle", conduct.name, hours);
    }

    Ok(())
}
