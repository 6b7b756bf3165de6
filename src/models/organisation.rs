// Battalions and companies: the password-protected owners of conducts

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Battalion {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub battalion_id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

impl Battalion {
    pub fn check_password(&self, candidate: &str) -> bool {
        check_password(candidate, &self.password_hash)
    }
}

impl Company {
    pub fn check_password(&self, candidate: &str) -> bool {
        check_password(candidate, &self.password_hash)
    }
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    hash(password.as_bytes(), DEFAULT_COST).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// A malformed stored hash counts as a mismatch.
pub fn check_password(candidate: &str, stored_hash: &str) -> bool {
    verify(candidate.as_bytes(), stored_hash).unwrap_or(false)
}
