// Conduct queries

use chrono::NaiveDateTime;
use sqlx::{PgExecutor, Postgres, Transaction};

use crate::database::repository::decode;
use crate::models::conduct::{Conduct, ConductRow, ConductStatus};

const CONDUCT_COLUMNS: &str = "id, company_id, name, pin, status, created_at, last_activity_at";

fn decode_all(rows: Vec<ConductRow>) -> sqlx::Result<Vec<Conduct>> {
    rows.into_iter().map(decode).collect()
}

/// Inserts an active conduct. A PIN collision surfaces as a unique violation.
pub async fn insert_conduct<'e, E>(
    executor: E,
    company_id: i64,
    name: &str,
    pin: &str,
    now: NaiveDateTime,
) -> sqlx::Result<Conduct>
where
    E: PgExecutor<'e>,
{
    let row: ConductRow = sqlx::query_as::<_, ConductRow>(&format!(
        r#"
        INSERT INTO conducts (company_id, name, pin, status, created_at, last_activity_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING {CONDUCT_COLUMNS}
        "#
    ))
    .bind(company_id)
    .bind(name)
    .bind(pin)
    .bind(ConductStatus::Active.as_str())
    .bind(now)
    .fetch_one(executor)
    .await?;

    decode(row)
}

pub async fn get_conduct<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Conduct>>
where
    E: PgExecutor<'e>,
{
    let row: Option<ConductRow> = sqlx::query_as::<_, ConductRow>(&format!(
        "SELECT {CONDUCT_COLUMNS} FROM conducts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(decode).transpose()
}

pub async fn find_by_pin<'e, E>(executor: E, pin: &str) -> sqlx::Result<Option<Conduct>>
where
    E: PgExecutor<'e>,
{
    let row: Option<ConductRow> = sqlx::query_as::<_, ConductRow>(&format!(
        "SELECT {CONDUCT_COLUMNS} FROM conducts WHERE pin = $1"
    ))
    .bind(pin)
    .fetch_optional(executor)
    .await?;

    row.map(decode).transpose()
}

/// Conducts of one company, newest first.
pub async fn conducts_for_company<'e, E>(executor: E, company_id: i64) -> sqlx::Result<Vec<Conduct>>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<ConductRow> = sqlx::query_as::<_, ConductRow>(&format!(
        "SELECT {CONDUCT_COLUMNS} FROM conducts WHERE company_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(company_id)
    .fetch_all(executor)
    .await?;

    decode_all(rows)
}

/// Conducts of every company in a battalion, newest first.
pub async fn conducts_for_battalion<'e, E>(executor: E, battalion_id: i64) -> sqlx::Result<Vec<Conduct>>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<ConductRow> = sqlx::query_as::<_, ConductRow>(
        r#"
        SELECT c.id, c.company_id, c.name, c.pin, c.status, c.created_at, c.last_activity_at
        FROM conducts c
        JOIN companies co ON co.id = c.company_id
        WHERE co.battalion_id = $1
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(battalion_id)
    .fetch_all(executor)
    .await?;

    decode_all(rows)
}

/// `(conduct id, owning battalion id, conduct name)` for each id that exists.
pub async fn owning_battalions<'e, E>(executor: E, conduct_ids: &[i64]) -> sqlx::Result<Vec<(i64, i64, String)>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, (i64, i64, String)>(
        r#"
        SELECT c.id, co.battalion_id, c.name
        FROM conducts c
        JOIN companies co ON co.id = c.company_id
        WHERE c.id = ANY($1)
        "#,
    )
    .bind(conduct_ids)
    .fetch_all(executor)
    .await
}

pub async fn set_status<'e, E>(
    executor: E,
    id: i64,
    status: ConductStatus,
    last_activity_at: Option<NaiveDateTime>,
) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE conducts
        SET status = $2, last_activity_at = COALESCE($3, last_activity_at)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(last_activity_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn touch_activity<'e, E>(executor: E, id: i64, now: NaiveDateTime) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE conducts SET last_activity_at = $2 WHERE id = $1")
        .bind(id)
        .bind(now)
        .execute(executor)
        .await?;
    Ok(())
}

/// Active conducts idle since before `cutoff` with nobody working or resting.
pub async fn stale_active_conducts<'e, E>(executor: E, cutoff: NaiveDateTime) -> sqlx::Result<Vec<Conduct>>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<ConductRow> = sqlx::query_as::<_, ConductRow>(
        r#"
        SELECT c.id, c.company_id, c.name, c.pin, c.status, c.created_at, c.last_activity_at
        FROM conducts c
        WHERE c.status = 'active'
          AND COALESCE(c.last_activity_at, c.created_at) < $1
          AND NOT EXISTS (
              SELECT 1 FROM conduct_users u
              WHERE u.conduct_id = c.id AND u.status IN ('working', 'resting')
          )
        "#,
    )
    .bind(cutoff)
    .fetch_all(executor)
    .await?;

    decode_all(rows)
}

/// Removes the conducts with their logs and participants. Returns how many conducts went.
pub async fn delete_conducts(tx: &mut Transaction<'_, Postgres>, conduct_ids: &[i64]) -> sqlx::Result<u64> {
    sqlx::query("DELETE FROM activity_logs WHERE conduct_id = ANY($1)")
        .bind(conduct_ids)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM conduct_users WHERE conduct_id = ANY($1)")
        .bind(conduct_ids)
        .execute(&mut **tx)
        .await?;

    let deleted: sqlx::postgres::PgQueryResult = sqlx::query("DELETE FROM conducts WHERE id = ANY($1)")
        .bind(conduct_ids)
        .execute(&mut **tx)
        .await?;

    Ok(deleted.rows_affected())
}
