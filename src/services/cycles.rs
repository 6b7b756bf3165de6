// Work/rest cycle commands issued by trainers and the conducting body

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info};

use crate::config::state::AppState;
use crate::database::repository::activity::{self as activity_repo, NewActivity};
use crate::database::repository::users as user_repo;
use crate::domain::clock::clock_string;
use crate::domain::cycle::{authorize_zone_change, Actor, CycleView, UserStatus};
use crate::domain::system_status::{CutOffTransition, SystemStatus};
use crate::domain::zones::{minutes, rest_for, Zone};
use crate::models::{ActivityAction, User};
use crate::realtime::events::WorkCompleteModal;
use crate::realtime::ServerEvent;
use crate::services::{activity, users};
use crate::utils::utils::non_blank;
use crate::utils::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct ZoneSet {
    pub user: String,
    pub zone: Zone,
    #[serde(serialize_with = "clock_string::serialize")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(serialize_with = "clock_string::serialize")]
    pub end_time: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct RestStarted {
    #[serde(serialize_with = "clock_string::serialize")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(serialize_with = "clock_string::serialize")]
    pub end_time: Option<NaiveDateTime>,
}

/// Starts (or overwrites) a work cycle for the actor or, for the conducting body, any participant.
pub async fn set_zone(
    state: &AppState,
    user_id: i64,
    target_user: Option<&str>,
    zone: Zone,
    location: Option<String>,
) -> ApiResult<ZoneSet> {
    let actor: User = users::require_fresh_user(state, user_id).await?;
    let now: NaiveDateTime = state.clock.now();

    let mut target: User = match non_blank(target_user) {
        Some(name) if name != actor.name => {
            let pool: &PgPool = state.database.get_pool()?;
            user_repo::find_by_name(pool, actor.conduct_id, name)
                .await?
                .ok_or_else(|| ApiError::not_found("Target user not found"))?
        }
        _ => actor.clone(),
    };

    let status: SystemStatus = state.statuses.get(actor.conduct_id).await;
    authorize_zone_change(
        Actor { name: &actor.name, role: actor.role },
        &target.name,
        &target.cycle,
        &status,
        now,
    )?;

    target.cycle.start_work(zone, now);
    target.location = location.and_then(|l: String| non_blank(Some(&l)).map(str::to_string));

    users::save(state, &target).await?;
    activity::record(state, target.conduct_id, &target.name, ActivityAction::StartWork, Some(zone), None).await;
    users::broadcast(state, &target).await;

    info!(
        conduct_id = target.conduct_id,
        zone = %zone,
        by = %actor.name,
        "Work cycle started for '{}'", target.name
    );

    Ok(ZoneSet {
        user: target.name,
        zone,
        start_time: target.cycle.start_time,
        end_time: target.cycle.end_time,
    })
}

/// Switches cut-off on or off for the actor's conduct and moves every trainer accordingly.
pub async fn toggle_cut_off(state: &AppState, user_id: i64) -> ApiResult<SystemStatus> {
    let actor: User = match users::require_fresh_user(state, user_id).await {
        Ok(user) if user.is_conducting_body() => user,
        Ok(_) | Err(ApiError::NotFound(_)) => return Err(ApiError::unauthorized("Unauthorized")),
        Err(e) => return Err(e),
    };

    let conduct_id: i64 = actor.conduct_id;
    let now: NaiveDateTime = state.clock.now();
    let pool: &PgPool = state.database.get_pool()?;

    let (transition, status) = state.statuses.update(conduct_id, |s: &mut SystemStatus| s.toggle(now)).await;

    let mut trainers: Vec<User> = user_repo::trainers_in_conduct(pool, conduct_id).await?;
    for trainer in trainers.iter_mut() {
        match transition {
            CutOffTransition::Activated => trainer.cycle.enter_cut_off(),
            CutOffTransition::Lifted { rest_until } => trainer.cycle.mandatory_rest(now, rest_until - now),
        }
    }
    save_all(state, &trainers).await?;

    for trainer in &trainers {
        users::broadcast(state, trainer).await;
    }
    state
        .realtime
        .emit_to_conduct(conduct_id, ServerEvent::SystemStatusUpdate(status.clone()))
        .await;

    info!(conduct_id, cut_off = status.cut_off, trainers = trainers.len(), "Cut-off toggled");
    Ok(status)
}

/// Ends the current cycle early. The stringency tracker survives.
pub async fn stop_cycle(state: &AppState, user_id: i64) -> ApiResult<()> {
    let mut user: User = users::require_fresh_user(state, user_id).await?;

    user.cycle.stop();
    users::save(state, &user).await?;

    activity::record(state, user.conduct_id, &user.name, ActivityAction::EarlyCompletion, None, None).await;
    users::broadcast(state, &user).await;
    Ok(())
}

/// Starts the rest period sized by the strictest zone worked since the last rest.
pub async fn start_rest(state: &AppState, user_id: i64) -> ApiResult<RestStarted> {
    let mut user: User = users::require_fresh_user(state, user_id).await?;
    let now: NaiveDateTime = state.clock.now();

    let worked_zone: Option<Zone> = user.cycle.zone;
    let (rest_zone, rest) = user.cycle.start_rest(now);

    users::save(state, &user).await?;

    activity::record(
        state,
        user.conduct_id,
        &user.name,
        ActivityAction::StartRest,
        worked_zone,
        Some(rest_details(rest_zone, rest)),
    )
    .await;
    users::broadcast(state, &user).await;

    Ok(RestStarted {
        start_time: user.cycle.start_time,
        end_time: user.cycle.end_time,
    })
}

fn rest_details(rest_zone: Option<Zone>, rest: Duration) -> String {
    let zone_name: &str = rest_zone.map(|z: Zone| z.as_str()).unwrap_or("None");

    if rest_zone == Some(Zone::Test) {
        format!(
            "Started {} second rest period (based on most stringent zone: {})",
            rest.num_seconds(),
            zone_name
        )
    } else {
        format!(
            "Started {} minute rest period (based on most stringent zone: {})",
            format_minutes(minutes(rest)),
            zone_name
        )
    }
}

// * Whole minutes print without a fractional part
fn format_minutes(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub async fn user_state(state: &AppState, conduct_id: i64, username: &str) -> ApiResult<CycleView> {
    let user: User = users::require_by_name(state, conduct_id, username).await?;
    Ok(CycleView::from(&user.cycle))
}

/// Resets every trainer and the conduct's cut-off state.
pub async fn clear_commands(state: &AppState, user_id: i64) -> ApiResult<&'static str> {
    let actor: User = users::require_fresh_user(state, user_id).await?;
    if !actor.is_conducting_body() {
        return Err(ApiError::unauthorized("Only conducting body can use this function"));
    }

    let conduct_id: i64 = actor.conduct_id;
    let pool: &PgPool = state.database.get_pool()?;

    let mut trainers: Vec<User> = user_repo::trainers_in_conduct(pool, conduct_id).await?;
    for trainer in trainers.iter_mut() {
        trainer.cycle.reset();
    }
    save_all(state, &trainers).await?;

    for trainer in &trainers {
        activity::record(
            state,
            conduct_id,
            &trainer.name,
            ActivityAction::InterfaceReset,
            None,
            Some("Trainer interface reset by conducting body".to_string()),
        )
        .await;
        users::broadcast(state, trainer).await;
    }

    let status: SystemStatus = state.statuses.reset(conduct_id).await;
    state
        .realtime
        .emit_to_conduct(conduct_id, ServerEvent::SystemStatusUpdate(status))
        .await;

    activity::record(
        state,
        conduct_id,
        &actor.name,
        ActivityAction::ClearCommands,
        None,
        Some("All commands cleared and trainer interfaces reset".to_string()),
    )
    .await;

    Ok("All commands cleared and trainer interfaces reset successfully")
}

/// Removes a trainer from the conduct.
pub async fn remove_user(state: &AppState, user_id: i64, target_user: Option<&str>) -> ApiResult<String> {
    let actor: User = users::require_fresh_user(state, user_id).await?;
    if !actor.is_conducting_body() {
        return Err(ApiError::unauthorized("Only conducting body can remove users"));
    }

    let pool: &PgPool = state.database.get_pool()?;
    let target_name: &str = non_blank(target_user).ok_or_else(|| ApiError::not_found("Target user not found"))?;

    let target: User = user_repo::find_by_name(pool, actor.conduct_id, target_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Target user not found"))?;

    if target.is_conducting_body() {
        return Err(ApiError::forbidden("Cannot remove conducting body users"));
    }

    activity::record(
        state,
        actor.conduct_id,
        &actor.name,
        ActivityAction::UserRemoved,
        None,
        Some(format!("Removed user {} from conduct", target.name)),
    )
    .await;

    user_repo::delete_user(pool, target.id).await?;
    users::invalidate(state, target.id).await;

    state
        .realtime
        .emit_to_conduct(actor.conduct_id, ServerEvent::UserRemoved { user: target.name.clone() })
        .await;

    Ok(format!("User {} removed successfully", target.name))
}

/// Finishes a rest period: the log row and the reset land in one transaction,
/// then every client is told. `completed_at` is the time the log is stamped with.
pub async fn complete_rest(
    state: &AppState,
    mut user: User,
    completed_at: NaiveDateTime,
    details: String,
) -> ApiResult<User> {
    let pool: &PgPool = state.database.get_pool()?;
    let completed_zone: Option<Zone> = user.cycle.zone;
    let zone_name: Option<&str> = completed_zone.map(|z: Zone| z.as_str());

    let mut tx: Transaction<'static, Postgres> = pool.begin().await?;

    activity_repo::insert_log(
        &mut *tx,
        &NewActivity {
            conduct_id: user.conduct_id,
            username: &user.name,
            action: ActivityAction::CompletedRest,
            zone: zone_name,
            details: Some(details),
            timestamp: completed_at,
        },
    )
    .await?;

    user.cycle.reset();
    user_repo::save_user(&mut *tx, &user).await?;
    tx.commit().await?;

    users::invalidate(state, user.id).await;
    announce_rest_completed(state, &user, zone_name).await;

    info!(conduct_id = user.conduct_id, zone = zone_name.unwrap_or("None"), "Rest cycle completed for '{}'", user.name);
    Ok(user)
}

// ! Runs after commit, so nothing here may fail the caller
async fn announce_rest_completed(state: &AppState, user: &User, zone_name: Option<&str>) {
    let conduct_id: i64 = user.conduct_id;
    users::broadcast(state, user).await;

    state
        .realtime
        .emit_to_conduct(
            conduct_id,
            ServerEvent::RestCycleCompleted {
                user: user.name.clone(),
                zone: zone_name.map(str::to_string),
                action: "rest_cycle_completed",
            },
        )
        .await;

    if let Err(e) = activity::broadcast_history(state, conduct_id, Some("rest_completion")).await {
        error!(conduct_id, "Failed to broadcast history after rest completion: {}", e);
    }

    state
        .realtime
        .emit_to_conduct(
            conduct_id,
            ServerEvent::ForceHistoryRefresh {
                conduct_id,
                message: format!("{} completed rest cycle in {} zone", user.name, zone_name.unwrap_or("None")),
                action: "rest_completed",
            },
        )
        .await;
}

/// Tells the participant (globally) and their conduct room that work is done and rest is due.
pub async fn notify_work_complete(state: &AppState, user: &User) {
    let zone: Option<String> = user.cycle.zone.map(|z: Zone| z.to_string());
    // * Quotes the rest start_rest will actually give: the strictest zone worked, not the current one
    let rest_minutes: f64 = minutes(rest_for(user.cycle.rest_zone()));

    state.realtime.emit_global(ServerEvent::ShowWorkCompleteModal(WorkCompleteModal {
        username: user.name.clone(),
        zone: zone.clone(),
        rest_duration: rest_minutes,
        title: "Work Cycle Complete!",
        message: "Your work cycle has ended. Time to start rest cycle!",
    }));

    state
        .realtime
        .emit_to_conduct(
            user.conduct_id,
            ServerEvent::WorkCycleCompleted {
                username: user.name.clone(),
                zone,
                rest_time: rest_minutes,
                action: "work_cycle_completed",
            },
        )
        .await;
}

/// True when the monitor should mark this participant's work as done.
pub fn work_due(user: &User, now: NaiveDateTime) -> bool {
    user.cycle.status == UserStatus::Working && !user.cycle.work_completed && user.cycle.is_due(now)
}

// * Batch writes share one transaction; cache entries drop after commit
async fn save_all(state: &AppState, batch: &[User]) -> ApiResult<()> {
    if batch.is_empty() {
        return Ok(());
    }

    let pool: &PgPool = state.database.get_pool()?;
    let mut tx: Transaction<'static, Postgres> = pool.begin().await?;
    for user in batch {
        user_repo::save_user(&mut *tx, user).await?;
    }
    tx.commit().await?;

    for user in batch {
        users::invalidate(state, user.id).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::environment::EnvironmentVariables;
    use crate::domain::cycle::{CycleState, Role};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn trainer() -> User {
        User {
            id: 1,
            conduct_id: 2,
            name: "alpha".into(),
            role: Role::Trainer,
            location: None,
            cycle: CycleState::new(UserStatus::Idle),
        }
    }

    #[test]
    fn rest_details_use_minutes_or_seconds() {
        assert_eq!(
            rest_details(Some(Zone::Red), Duration::minutes(30)),
            "Started 30 minute rest period (based on most stringent zone: red)"
        );
        assert_eq!(
            rest_details(Some(Zone::Test), Duration::seconds(10)),
            "Started 10 second rest period (based on most stringent zone: test)"
        );
        assert_eq!(
            rest_details(None, Duration::minutes(15)),
            "Started 15 minute rest period (based on most stringent zone: None)"
        );
    }

    #[test]
    fn fractional_minutes_keep_their_fraction() {
        assert_eq!(format_minutes(15.0), "15");
        assert_eq!(format_minutes(0.5), "0.5");
    }

    #[test]
    fn work_is_due_only_while_working_and_unfinished() {
        let mut user: User = trainer();
        assert!(!work_due(&user, at(9, 0, 0)));

        user.cycle.start_work(Zone::Test, at(9, 0, 0));
        assert!(!work_due(&user, at(9, 0, 6)));
        assert!(work_due(&user, at(9, 0, 7)));

        user.cycle.complete_work();
        assert!(!work_due(&user, at(9, 0, 8)));
    }

    fn offline_state() -> AppState {
        let env: EnvironmentVariables = EnvironmentVariables::from_map(&Default::default()).unwrap();
        AppState::from_environment(env).unwrap()
    }

    #[tokio::test]
    async fn rest_completion_is_announced_even_when_history_is_unavailable() {
        let state: AppState = offline_state();
        let mut room = state.realtime.subscribe(2).await;

        announce_rest_completed(&state, &trainer(), Some("red")).await;

        let mut names: Vec<&'static str> = Vec::new();
        while let Ok(event) = room.try_recv() {
            names.push(event.name());
        }
        assert_eq!(names, vec!["user_update", "rest_cycle_completed", "force_history_refresh"]);
    }

    #[tokio::test]
    async fn work_complete_quotes_the_rest_for_the_strictest_zone_worked() {
        let state: AppState = offline_state();
        let mut room = state.realtime.subscribe(2).await;

        let mut user: User = trainer();
        user.cycle.start_work(Zone::Black, at(9, 0, 0));
        user.cycle.start_work(Zone::Green, at(9, 10, 0));
        user.cycle.complete_work();

        notify_work_complete(&state, &user).await;

        match room.try_recv().unwrap() {
            ServerEvent::WorkCycleCompleted { zone, rest_time, .. } => {
                assert_eq!(zone.as_deref(), Some("green"));
                assert_eq!(rest_time, minutes(rest_for(Some(Zone::Black))));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
