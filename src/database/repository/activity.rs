// Activity log queries

use chrono::NaiveDateTime;
use sqlx::PgExecutor;

use crate::models::activity::{ActivityAction, ActivityLog};

/// A log row about to be written.
#[derive(Debug, Clone)]
pub struct NewActivity<'a> {
    pub conduct_id: i64,
    pub username: &'a str,
    pub action: ActivityAction,
    pub zone: Option<&'a str>,
    pub details: Option<String>,
    pub timestamp: NaiveDateTime,
}

pub async fn insert_log<'e, E>(executor: E, entry: &NewActivity<'_>) -> sqlx::Result<i64>
where
    E: PgExecutor<'e>,
{
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO activity_logs (conduct_id, username, action, zone, details, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(entry.conduct_id)
    .bind(entry.username)
    .bind(entry.action.as_str())
    .bind(entry.zone)
    .bind(entry.details.as_deref())
    .bind(entry.timestamp)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Newest first; `limit = None` returns every row.
pub async fn history<'e, E>(executor: E, conduct_id: i64, limit: Option<i64>) -> sqlx::Result<Vec<ActivityLog>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ActivityLog>(
        r#"
        SELECT id, conduct_id, username, action, zone, details, timestamp
        FROM activity_logs
        WHERE conduct_id = $1
        ORDER BY timestamp DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(conduct_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// True when `username` has a log of `action` at or after `since`.
pub async fn logged_since<'e, E>(
    executor: E,
    conduct_id: i64,
    username: &str,
    action: ActivityAction,
    since: NaiveDateTime,
) -> sqlx::Result<bool>
where
    E: PgExecutor<'e>,
{
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM activity_logs
            WHERE conduct_id = $1 AND username = $2 AND action = $3 AND timestamp >= $4
        )
        "#,
    )
    .bind(conduct_id)
    .bind(username)
    .bind(action.as_str())
    .bind(since)
    .fetch_one(executor)
    .await?;

    Ok(exists)
}
