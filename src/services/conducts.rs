// Organisation and conduct lifecycle: creation, access, overview, deletion,
// password changes, joining and the per-role landing views.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::state::AppState;
use crate::database::repository::{
    activity as activity_repo, conducts as conduct_repo, is_unique_violation,
    organisation as org_repo, users as user_repo,
};
use crate::domain::clock::DATE_TIME_FORMAT;
use crate::domain::cycle::Role;
use crate::domain::pin::{generate_pin, is_valid_pin};
use crate::domain::system_status::SystemStatus;
use crate::domain::zones::Zone;
use crate::models::conduct::{Conduct, ConductStatus};
use crate::models::organisation::hash_password;
use crate::models::{ActivityAction, Battalion, Company, HistoryEntry, User, UserSnapshot, SYSTEM_USER};
use crate::services::{activity, users};
use crate::utils::utils::non_blank;
use crate::utils::{ApiError, ApiResult};

const PIN_ATTEMPTS: usize = 10;
const MIN_PASSWORD_LENGTH: usize = 6;
// ! Repeated page loads inside this window do not log another join
const JOIN_LOG_WINDOW_MINUTES: i64 = 5;

#[derive(Debug, Serialize)]
pub struct CreatedConduct {
    pub battalion_id: i64,
    pub company_id: i64,
    pub conduct_id: i64,
    pub conduct_name: String,
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct CompanyConducts {
    pub company: Company,
    pub conducts: Vec<Conduct>,
}

#[derive(Debug, Serialize)]
pub struct BattalionOverview {
    pub battalion: Battalion,
    pub companies: Vec<CompanyConducts>,
    pub total_conducts: usize,
    pub active_conducts: usize,
}

#[derive(Debug, Serialize)]
pub struct SetupResult {
    pub user_id: i64,
    pub conduct_id: i64,
    pub role: Role,
    pub session_token: String,
    /// Which client view to open: `dashboard` or `monitor`.
    pub interface: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user_id: i64,
    pub conduct_id: i64,
    pub user: UserSnapshot,
    pub zones: Value,
    pub system_status: SystemStatus,
}

#[derive(Debug, Serialize)]
pub struct MonitorView {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub conduct_id: i64,
    pub users: BTreeMap<String, UserSnapshot>,
    pub zones: Value,
    pub system_status: SystemStatus,
    pub history: Vec<HistoryEntry>,
}

/// Whose password is being changed.
#[derive(Debug, Clone, Copy)]
pub enum PasswordTarget<'a> {
    Battalion { battalion: &'a str },
    Company { battalion: &'a str, company: &'a str },
}

// =============================================================================
// CREATION & ACCESS
// =============================================================================

/// Creates a conduct, creating its battalion and company on first use.
pub async fn create_conduct(
    state: &AppState,
    battalion_name: Option<&str>,
    company_name: Option<&str>,
    conduct_name: Option<&str>,
    company_password: Option<&str>,
) -> ApiResult<CreatedConduct> {
    let (Some(battalion_name), Some(company_name), Some(conduct_name), Some(company_password)) = (
        non_blank(battalion_name),
        non_blank(company_name),
        non_blank(conduct_name),
        non_blank(company_password),
    ) else {
        return Err(ApiError::bad_request("All fields are required."));
    };

    let pool: &PgPool = state.database.get_pool()?;
    let now: NaiveDateTime = state.clock.now();
    let mut tx: Transaction<'static, Postgres> = pool.begin().await?;

    let battalion: Battalion = match org_repo::find_battalion(&mut *tx, battalion_name).await? {
        Some(battalion) => battalion,
        None => {
            let password_hash: String = hash_password(&state.environment.default_battalion_password)?;
            org_repo::insert_battalion(&mut *tx, battalion_name, &password_hash, now)
                .await
                .map_err(|e| conflict_on_duplicate(e, "Battalion was created concurrently, please retry"))?
        }
    };

    let company: Company = match org_repo::find_company(&mut *tx, battalion.id, company_name).await? {
        Some(company) if company.check_password(company_password) => company,
        Some(_) => return Err(ApiError::unauthorized("Incorrect company password.")),
        None => {
            let password_hash: String = hash_password(company_password)?;
            org_repo::insert_company(&mut *tx, battalion.id, company_name, &password_hash, now)
                .await
                .map_err(|e| conflict_on_duplicate(e, "Company was created concurrently, please retry"))?
        }
    };

    let conduct: Conduct = insert_with_unique_pin(&mut tx, company.id, conduct_name, now).await?;
    tx.commit().await?;

    info!(conduct_id = conduct.id, pin = %conduct.pin, "Conduct '{}' created", conduct.name);

    Ok(CreatedConduct {
        battalion_id: battalion.id,
        company_id: company.id,
        conduct_id: conduct.id,
        conduct_name: conduct.name,
        pin: conduct.pin,
    })
}

// * Each attempt runs in a savepoint so a PIN collision does not abort the outer transaction
async fn insert_with_unique_pin(
    tx: &mut Transaction<'static, Postgres>,
    company_id: i64,
    name: &str,
    now: NaiveDateTime,
) -> ApiResult<Conduct> {
    for attempt in 1..=PIN_ATTEMPTS {
        let pin: String = generate_pin();
        let mut savepoint: Transaction<'_, Postgres> = (&mut *tx).begin().await?;

        match conduct_repo::insert_conduct(&mut *savepoint, company_id, name, &pin, now).await {
            Ok(conduct) => {
                savepoint.commit().await?;
                return Ok(conduct);
            }
            Err(e) if is_unique_violation(&e) => {
                savepoint.rollback().await?;
                warn!(attempt, "Conduct PIN collision, generating another");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(anyhow::anyhow!("Could not allocate a unique conduct PIN after {} attempts", PIN_ATTEMPTS).into())
}

fn conflict_on_duplicate(err: sqlx::Error, message: &str) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict(message.to_string())
    } else {
        err.into()
    }
}

/// Battalion HQ access. Returns the battalion id to open.
pub async fn access_battalion(state: &AppState, name: Option<&str>, password: Option<&str>) -> ApiResult<i64> {
    let (Some(name), Some(password)) = (non_blank(name), non_blank(password)) else {
        return Err(ApiError::bad_request("Both battalion name and password are required."));
    };

    let pool: &PgPool = state.database.get_pool()?;
    match org_repo::find_battalion(pool, name).await? {
        Some(battalion) if battalion.check_password(password) => Ok(battalion.id),
        _ => Err(ApiError::unauthorized("Invalid battalion name or password.")),
    }
}

/// Company access within a named battalion. Returns the company id to open.
pub async fn access_company(
    state: &AppState,
    battalion_name: Option<&str>,
    company_name: Option<&str>,
    password: Option<&str>,
) -> ApiResult<i64> {
    let (Some(battalion_name), Some(company_name), Some(password)) =
        (non_blank(battalion_name), non_blank(company_name), non_blank(password))
    else {
        return Err(ApiError::bad_request(
            "Battalion name, company name, and company password are all required.",
        ));
    };

    let pool: &PgPool = state.database.get_pool()?;
    let battalion: Battalion = org_repo::find_battalion(pool, battalion_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Battalion not found. Please check the battalion name."))?;

    match org_repo::find_company(pool, battalion.id, company_name).await? {
        Some(company) if company.check_password(password) => Ok(company.id),
        _ => Err(ApiError::unauthorized("Invalid company name or password for the specified battalion.")),
    }
}

// =============================================================================
// OVERVIEWS
// =============================================================================

pub async fn battalion_overview(state: &AppState, battalion_id: i64) -> ApiResult<BattalionOverview> {
    let pool: &PgPool = state.database.get_pool()?;

    let battalion: Battalion = org_repo::get_battalion(pool, battalion_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Battalion not found"))?;

    let companies: Vec<Company> = org_repo::companies_for_battalion(pool, battalion_id).await?;
    let conducts: Vec<Conduct> = conduct_repo::conducts_for_battalion(pool, battalion_id).await?;

    let total_conducts: usize = conducts.len();
    let active_conducts: usize = conducts.iter().filter(|c: &&Conduct| c.is_active()).count();

    let mut by_company: HashMap<i64, Vec<Conduct>> = HashMap::new();
    for conduct in conducts {
        by_company.entry(conduct.company_id).or_default().push(conduct);
    }

    let companies: Vec<CompanyConducts> = companies
        .into_iter()
        .map(|company: Company| {
            let conducts: Vec<Conduct> = by_company.remove(&company.id).unwrap_or_default();
            CompanyConducts { company, conducts }
        })
        .collect();

    Ok(BattalionOverview {
        battalion,
        companies,
        total_conducts,
        active_conducts,
    })
}

pub async fn company_conducts(state: &AppState, company_id: i64) -> ApiResult<CompanyConducts> {
    let pool: &PgPool = state.database.get_pool()?;

    let company: Company = org_repo::get_company(pool, company_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))?;
    let conducts: Vec<Conduct> = conduct_repo::conducts_for_company(pool, company_id).await?;

    Ok(CompanyConducts { company, conducts })
}

/// Deletes conducts owned by the battalion, with their users and logs. Returns how many went.
pub async fn delete_conducts(state: &AppState, battalion_id: i64, conduct_ids: &[i64]) -> ApiResult<u64> {
    let ids: Vec<i64> = conduct_ids.iter().copied().collect::<BTreeSet<i64>>().into_iter().collect();
    if ids.is_empty() {
        return Err(ApiError::bad_request("No conducts selected for deletion."));
    }

    let pool: &PgPool = state.database.get_pool()?;

    org_repo::get_battalion(pool, battalion_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Battalion not found"))?;

    let owners: HashMap<i64, (i64, String)> = conduct_repo::owning_battalions(pool, &ids)
        .await?
        .into_iter()
        .map(|(id, owner, name)| (id, (owner, name)))
        .collect();

    for id in &ids {
        match owners.get(id) {
            None => return Err(ApiError::not_found(format!("Conduct ID {id} not found."))),
            Some((owner, name)) if *owner != battalion_id => {
                return Err(ApiError::forbidden(format!(
                    "Conduct \"{name}\" does not belong to this battalion."
                )));
            }
            Some(_) => {}
        }
    }

    let mut tx: Transaction<'static, Postgres> = pool.begin().await?;
    let deleted: u64 = conduct_repo::delete_conducts(&mut tx, &ids).await?;
    tx.commit().await?;

    state.statuses.forget(&ids).await;
    info!(battalion_id, deleted, "Conducts deleted");

    Ok(deleted)
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// Changes a battalion or company password. Names match exactly.
pub async fn change_password(
    state: &AppState,
    target: PasswordTarget<'_>,
    current_password: Option<&str>,
    new_password: Option<&str>,
    confirm_password: Option<&str>,
) -> ApiResult<String> {
    let names_present: bool = match target {
        PasswordTarget::Battalion { battalion } => non_blank(Some(battalion)).is_some(),
        PasswordTarget::Company { battalion, company } => {
            non_blank(Some(battalion)).is_some() && non_blank(Some(company)).is_some()
        }
    };

    let (Some(current), Some(new), Some(confirm)) =
        (non_blank(current_password), non_blank(new_password), non_blank(confirm_password))
    else {
        return Err(ApiError::bad_request("All fields are required."));
    };
    if !names_present {
        return Err(ApiError::bad_request("All fields are required."));
    }

    if new != confirm {
        return Err(ApiError::bad_request("New passwords do not match."));
    }

    if new.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request("Password must be at least 6 characters long."));
    }

    let pool: &PgPool = state.database.get_pool()?;

    match target {
        PasswordTarget::Battalion { battalion } => {
            let battalion: Battalion = org_repo::find_battalion_exact(pool, battalion.trim())
                .await?
                .ok_or_else(|| ApiError::not_found("Battalion not found."))?;

            if !battalion.check_password(current) {
                return Err(ApiError::unauthorized("Current password is incorrect."));
            }

            let password_hash: String = hash_password(new)?;
            org_repo::update_battalion_password(pool, battalion.id, &password_hash).await?;
            Ok(format!("Battalion password for {} updated successfully!", battalion.name))
        }
        PasswordTarget::Company { battalion, company } => {
            let battalion_name: &str = battalion.trim();
            let company_name: &str = company.trim();

            let battalion: Battalion = org_repo::find_battalion_exact(pool, battalion_name)
                .await?
                .ok_or_else(|| ApiError::not_found("Battalion not found."))?;

            let company: Company = org_repo::find_company_exact(pool, battalion.id, company_name)
                .await?
                .ok_or_else(|| {
                    ApiError::not_found(format!("Company {company_name} not found in {battalion_name} Battalion."))
                })?;

            if !company.check_password(current) {
                return Err(ApiError::unauthorized("Current password is incorrect."));
            }

            let password_hash: String = hash_password(new)?;
            org_repo::update_company_password(pool, company.id, &password_hash).await?;
            Ok(format!("Company password for {} Company updated successfully!", company.name))
        }
    }
}

// =============================================================================
// JOINING
// =============================================================================

/// Looks a conduct up by PIN, reactivating it if it had gone idle.
pub async fn join_conduct(state: &AppState, pin: Option<&str>) -> ApiResult<Conduct> {
    let pin: &str = non_blank(pin).unwrap_or_default();
    if !is_valid_pin(pin) {
        return Err(ApiError::bad_request("Please enter a valid 6-digit PIN"));
    }

    let pool: &PgPool = state.database.get_pool()?;
    let conduct: Conduct = conduct_repo::find_by_pin(pool, pin)
        .await?
        .ok_or_else(|| ApiError::not_found("Invalid PIN - conduct not found"))?;

    reactivate_if_inactive(state, conduct, "joining").await
}

async fn reactivate_if_inactive(state: &AppState, mut conduct: Conduct, trigger: &str) -> ApiResult<Conduct> {
    if conduct.is_active() {
        return Ok(conduct);
    }

    let pool: &PgPool = state.database.get_pool()?;
    let now: NaiveDateTime = state.clock.now();

    conduct_repo::set_status(pool, conduct.id, ConductStatus::Active, Some(now)).await?;
    conduct.status = ConductStatus::Active;
    conduct.last_activity_at = Some(now);

    info!(conduct_id = conduct.id, pin = %conduct.pin, "Conduct '{}' reactivated by user {}", conduct.name, trigger);

    activity::record(
        state,
        conduct.id,
        SYSTEM_USER,
        ActivityAction::ConductReactivated,
        None,
        Some(format!(
            "Conduct reactivated by user {} at {}",
            trigger,
            now.format(DATE_TIME_FORMAT)
        )),
    )
    .await;

    Ok(conduct)
}

/// Registers (or re-registers) a participant and opens a session.
pub async fn user_setup(
    state: &AppState,
    conduct_id: i64,
    user_name: Option<&str>,
    role: Option<&str>,
    conducting_body_password: Option<&str>,
) -> ApiResult<SetupResult> {
    let pool: &PgPool = state.database.get_pool()?;

    let conduct: Conduct = conduct_repo::get_conduct(pool, conduct_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Conduct not found"))?;
    let conduct: Conduct = reactivate_if_inactive(state, conduct, "accessing setup").await?;

    let (Some(user_name), Some(role)) = (non_blank(user_name), non_blank(role)) else {
        return Err(ApiError::bad_request("Name and role are required"));
    };
    let role: Role = role.parse().map_err(|_| ApiError::bad_request("Invalid role"))?;

    if role == Role::ConductingBody
        && non_blank(conducting_body_password) != Some(&*state.environment.conducting_body_password)
    {
        return Err(ApiError::unauthorized("Invalid conducting body password"));
    }

    let user: User = user_repo::upsert_user(pool, conduct.id, user_name, role).await?;
    conduct_repo::touch_activity(pool, conduct.id, state.clock.now()).await?;
    users::invalidate(state, user.id).await;

    let session_token: String = Uuid::new_v4().to_string();
    let session_data: String = json!({
        "user_id": user.id,
        "conduct_id": conduct.id,
        "name": user.name,
        "role": user.role,
    })
    .to_string();
    state
        .redis
        .create_session(&session_token, &session_data, state.environment.session_ttl_seconds)
        .await?;

    if user.is_trainer() {
        users::broadcast(state, &user).await;
        activity::record(
            state,
            conduct.id,
            &user.name,
            ActivityAction::UserJoined,
            None,
            Some(format!("Trainer {} joined the conduct", user.name)),
        )
        .await;
    }

    info!(conduct_id = conduct.id, user_id = user.id, role = %user.role, "User '{}' set up", user.name);

    Ok(SetupResult {
        user_id: user.id,
        conduct_id: conduct.id,
        role: user.role,
        session_token,
        interface: if user.is_trainer() { "dashboard" } else { "monitor" },
    })
}

// =============================================================================
// LANDING VIEWS
// =============================================================================

pub async fn dashboard(state: &AppState, user_id: i64) -> ApiResult<DashboardView> {
    let user: User = users::require_user(state, user_id).await?;
    if !user.is_trainer() {
        return Err(ApiError::forbidden("Dashboard is only available to trainers"));
    }

    let system_status: SystemStatus = state.statuses.get(user.conduct_id).await;
    log_join_once(state, &user, "Trainer accessed dashboard").await?;

    Ok(DashboardView {
        user_id: user.id,
        conduct_id: user.conduct_id,
        user: user.snapshot(),
        zones: Zone::table(),
        system_status,
    })
}

pub async fn monitor(state: &AppState, user_id: i64) -> ApiResult<MonitorView> {
    let user: User = users::require_user(state, user_id).await?;
    if !user.is_conducting_body() {
        return Err(ApiError::forbidden("Monitor is only available to the conducting body"));
    }

    let pool: &PgPool = state.database.get_pool()?;
    let participants: BTreeMap<String, UserSnapshot> = user_repo::users_in_conduct(pool, user.conduct_id)
        .await?
        .into_iter()
        .map(|u: User| (u.name.clone(), u.snapshot()))
        .collect();

    let system_status: SystemStatus = state.statuses.get(user.conduct_id).await;
    log_join_once(state, &user, "Conducting body accessed monitor").await?;
    let history: Vec<HistoryEntry> = activity::history(state, user.conduct_id, None).await?;

    Ok(MonitorView {
        user_id: user.id,
        username: user.name,
        role: user.role,
        conduct_id: user.conduct_id,
        users: participants,
        zones: Zone::table(),
        system_status,
        history,
    })
}

async fn log_join_once(state: &AppState, user: &User, details: &str) -> ApiResult<()> {
    let pool: &PgPool = state.database.get_pool()?;
    let since: NaiveDateTime = state.clock.now() - Duration::minutes(JOIN_LOG_WINDOW_MINUTES);

    let recent: bool =
        activity_repo::logged_since(pool, user.conduct_id, &user.name, ActivityAction::UserJoined, since).await?;

    if !recent {
        activity::record(
            state,
            user.conduct_id,
            &user.name,
            ActivityAction::UserJoined,
            None,
            Some(details.to_string()),
        )
        .await;
    }
    Ok(())
}
