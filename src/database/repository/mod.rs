// Start of file: /src/database/repository/mod.rs

/*
    * Query functions grouped per table. Every function takes any
    * `PgExecutor`, so callers pass either the pool or an open transaction.
*/

pub mod activity;
pub mod conducts;
pub mod organisation;
pub mod users;

// ! Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// True when the error is a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

// * Converts a raw row into its domain type, reporting bad text columns as decode errors
pub(crate) fn decode<R, T>(row: R) -> sqlx::Result<T>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    T::try_from(row).map_err(|e: anyhow::Error| sqlx::Error::Decode(e.into()))
}

// End of file: /src/database/repository/mod.rs
