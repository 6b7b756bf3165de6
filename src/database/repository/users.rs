// Conduct participant queries

use sqlx::PgExecutor;

use crate::database::repository::decode;
use crate::domain::cycle::{Role, UserStatus};
use crate::models::user::{User, UserRow};

const USER_COLUMNS: &str = "id, conduct_id, name, role, status, zone, start_time, end_time, \
                            location, work_completed, pending_rest, most_stringent_zone";

fn decode_all(rows: Vec<UserRow>) -> sqlx::Result<Vec<User>> {
    rows.into_iter().map(decode).collect()
}

pub async fn get_user<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM conduct_users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(decode).transpose()
}

pub async fn find_by_name<'e, E>(executor: E, conduct_id: i64, name: &str) -> sqlx::Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM conduct_users WHERE conduct_id = $1 AND name = $2"
    ))
    .bind(conduct_id)
    .bind(name)
    .fetch_optional(executor)
    .await?;

    row.map(decode).transpose()
}

pub async fn users_in_conduct<'e, E>(executor: E, conduct_id: i64) -> sqlx::Result<Vec<User>>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM conduct_users WHERE conduct_id = $1 ORDER BY name"
    ))
    .bind(conduct_id)
    .fetch_all(executor)
    .await?;

    decode_all(rows)
}

pub async fn trainers_in_conduct<'e, E>(executor: E, conduct_id: i64) -> sqlx::Result<Vec<User>>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM conduct_users WHERE conduct_id = $1 AND role = $2 ORDER BY name"
    ))
    .bind(conduct_id)
    .bind(Role::Trainer.as_str())
    .fetch_all(executor)
    .await?;

    decode_all(rows)
}

/// Every participant across conducts currently in `status`.
pub async fn users_with_status<'e, E>(executor: E, status: UserStatus) -> sqlx::Result<Vec<User>>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM conduct_users WHERE status = $1"
    ))
    .bind(status.as_str())
    .fetch_all(executor)
    .await?;

    decode_all(rows)
}

/// Creates the participant, or updates role and status when the name is already taken in the conduct.
pub async fn upsert_user<'e, E>(executor: E, conduct_id: i64, name: &str, role: Role) -> sqlx::Result<User>
where
    E: PgExecutor<'e>,
{
    let row: UserRow = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO conduct_users (conduct_id, name, role, status)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (conduct_id, name)
        DO UPDATE SET role = EXCLUDED.role, status = EXCLUDED.status
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(conduct_id)
    .bind(name)
    .bind(role.as_str())
    .bind(role.initial_status().as_str())
    .fetch_one(executor)
    .await?;

    decode(row)
}

/// Writes the cycle state and location back.
pub async fn save_user<'e, E>(executor: E, user: &User) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE conduct_users
        SET status = $2,
            zone = $3,
            start_time = $4,
            end_time = $5,
            location = $6,
            work_completed = $7,
            pending_rest = $8,
            most_stringent_zone = $9
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(user.cycle.status.as_str())
    .bind(user.cycle.zone.map(|z| z.as_str()))
    .bind(user.cycle.start_time)
    .bind(user.cycle.end_time)
    .bind(user.location.as_deref())
    .bind(user.cycle.work_completed)
    .bind(user.cycle.pending_rest)
    .bind(user.cycle.most_stringent_zone.map(|z| z.as_str()))
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_user<'e, E>(executor: E, id: i64) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("DELETE FROM conduct_users WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
