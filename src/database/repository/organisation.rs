// Battalion and company queries. Name lookups come in two flavours:
// case-insensitive for creating/opening, exact for password changes.

use chrono::NaiveDateTime;
use sqlx::PgExecutor;

use crate::models::{Battalion, Company};

pub async fn get_battalion<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Battalion>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Battalion>(
        "SELECT id, name, password_hash, created_at FROM battalions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_battalion<'e, E>(executor: E, name: &str) -> sqlx::Result<Option<Battalion>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Battalion>(
        "SELECT id, name, password_hash, created_at FROM battalions WHERE LOWER(name) = LOWER($1)",
    )
    .bind(name)
    .fetch_optional(executor)
    .await
}

pub async fn find_battalion_exact<'e, E>(executor: E, name: &str) -> sqlx::Result<Option<Battalion>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Battalion>(
        "SELECT id, name, password_hash, created_at FROM battalions WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(executor)
    .await
}

pub async fn insert_battalion<'e, E>(
    executor: E,
    name: &str,
    password_hash: &str,
    now: NaiveDateTime,
) -> sqlx::Result<Battalion>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Battalion>(
        r#"
        INSERT INTO battalions (name, password_hash, created_at)
        VALUES ($1, $2, $3)
        RETURNING id, name, password_hash, created_at
        "#,
    )
    .bind(name)
    .bind(password_hash)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn update_battalion_password<'e, E>(executor: E, id: i64, password_hash: &str) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE battalions SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn get_company<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Company>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Company>(
        "SELECT id, battalion_id, name, password_hash, created_at FROM companies WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_company<'e, E>(executor: E, battalion_id: i64, name: &str) -> sqlx::Result<Option<Company>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Company>(
        r#"
        SELECT id, battalion_id, name, password_hash, created_at
        FROM companies
        WHERE battalion_id = $1 AND LOWER(name) = LOWER($2)
        "#,
    )
    .bind(battalion_id)
    .bind(name)
    .fetch_optional(executor)
    .await
}

pub async fn find_company_exact<'e, E>(executor: E, battalion_id: i64, name: &str) -> sqlx::Result<Option<Company>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Company>(
        r#"
        SELECT id, battalion_id, name, password_hash, created_at
        FROM companies
        WHERE battalion_id = $1 AND name = $2
        "#,
    )
    .bind(battalion_id)
    .bind(name)
    .fetch_optional(executor)
    .await
}

pub async fn insert_company<'e, E>(
    executor: E,
    battalion_id: i64,
    name: &str,
    password_hash: &str,
    now: NaiveDateTime,
) -> sqlx::Result<Company>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (battalion_id, name, password_hash, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, battalion_id, name, password_hash, created_at
        "#,
    )
    .bind(battalion_id)
    .bind(name)
    .bind(password_hash)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn update_company_password<'e, E>(executor: E, id: i64, password_hash: &str) -> sqlx::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE companies SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn companies_for_battalion<'e, E>(executor: E, battalion_id: i64) -> sqlx::Result<Vec<Company>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Company>(
        r#"
        SELECT id, battalion_id, name, password_hash, created_at
        FROM companies
        WHERE battalion_id = $1
        ORDER BY name
        "#,
    )
    .bind(battalion_id)
    .fetch_all(executor)
    .await
}
