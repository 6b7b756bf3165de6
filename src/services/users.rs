// Participant loading with a short-lived Redis cache in front of Postgres

use sqlx::PgPool;
use tracing::warn;

use crate::config::state::AppState;
use crate::database::repository::users as user_repo;
use crate::models::User;
use crate::realtime::ServerEvent;
use crate::utils::{ApiError, ApiResult};

/// Loads a participant, preferring the cache. Cache failures fall back to Postgres.
pub async fn load_user(state: &AppState, user_id: i64) -> ApiResult<Option<User>> {
    match state.redis.get_cached_user(user_id).await {
        Ok(Some(cached)) => match serde_json::from_str::<User>(&cached) {
            Ok(user) => return Ok(Some(user)),
            Err(e) => warn!(user_id, "Discarding unreadable cached user: {}", e),
        },
        Ok(None) => {}
        Err(e) => warn!(user_id, "User cache unavailable: {:#}", e),
    }

    let pool: &PgPool = state.database.get_pool()?;
    let user: Option<User> = user_repo::get_user(pool, user_id).await?;

    if let Some(user) = &user {
        cache(state, user).await;
    }

    Ok(user)
}

/// Cached read that must find the participant.
pub async fn require_user(state: &AppState, user_id: i64) -> ApiResult<User> {
    load_user(state, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Uncached read for code paths that modify the participant.
pub async fn require_fresh_user(state: &AppState, user_id: i64) -> ApiResult<User> {
    let pool: &PgPool = state.database.get_pool()?;
    user_repo::get_user(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn require_by_name(state: &AppState, conduct_id: i64, username: &str) -> ApiResult<User> {
    let pool: &PgPool = state.database.get_pool()?;
    user_repo::find_by_name(pool, conduct_id, username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Writes the participant back and drops the stale cache entry.
pub async fn save(state: &AppState, user: &User) -> ApiResult<()> {
    let pool: &PgPool = state.database.get_pool()?;
    user_repo::save_user(pool, user).await?;
    invalidate(state, user.id).await;
    Ok(())
}

pub async fn invalidate(state: &AppState, user_id: i64) {
    if let Err(e) = state.redis.invalidate_user(user_id).await {
        warn!(user_id, "Failed to invalidate cached user: {:#}", e);
    }
}

async fn cache(state: &AppState, user: &User) {
    let payload: String = match serde_json::to_string(user) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(user_id = user.id, "Failed to serialize user for cache: {}", e);
            return;
        }
    };

    let ttl: u64 = state.environment.user_cache_ttl_seconds;
    if let Err(e) = state.redis.cache_user(user.id, &payload, ttl).await {
        warn!(user_id = user.id, "Failed to cache user: {:#}", e);
    }
}

/// Pushes the participant's current state to the conduct room.
pub async fn broadcast(state: &AppState, user: &User) {
    state
        .realtime
        .emit_to_conduct(user.conduct_id, ServerEvent::UserUpdate(user.snapshot()))
        .await;
}
