use std::sync::Arc;
use anyhow::{Context, Result};
use redis::{AsyncCommands, Client};
use tracing::info;
use crate::config::environment::EnvironmentVariables;

const USER_KEY_PREFIX: &str = "user";
const SESSION_KEY_PREFIX: &str = "session";

#[derive(Debug, Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub fn new(env: Arc<EnvironmentVariables>) -> Result<Self> {
        let client = Client::open(&*env.redis_url)
            .context("Failed to create Redis client")?;
        Ok(Self { client })
    }

    pub async fn initialize(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;

        // Simple ping to verify connection
        let _: () = redis::cmd("PING").query_async(&mut conn).await
            .context("Failed to ping Redis")?;

        info!("Redis connection established successfully");
        Ok(())
    }

    pub async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client.get_multiplexed_async_connection().await
            .context("Failed to get Redis multiplexed connection")
    }

    pub async fn shutdown(&self) {
        // Connections are dropped with the client
        info!("Redis service shutdown (noop)");
    }

    /// Returns the cached JSON for a participant, if still fresh.
    pub async fn get_cached_user(&self, user_id: i64) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let key: String = user_key(user_id);

        let cached: Option<String> = conn.get(&key)
            .await
            .context("Failed to read cached user from Redis")?;

        Ok(cached)
    }

    /// Caches a participant's JSON for `ttl_seconds`.
    pub async fn cache_user(&self, user_id: i64, payload: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key: String = user_key(user_id);

        let _: () = conn.set_ex(&key, payload, ttl_seconds)
            .await
            .context("Failed to cache user in Redis")?;

        Ok(())
    }

    pub async fn invalidate_user(&self, user_id: i64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key: String = user_key(user_id);

        let _: () = redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .context("Failed to invalidate cached user in Redis")?;

        Ok(())
    }

    /// Stores session data under a fresh token.
    pub async fn create_session(&self, token: &str, session_data: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key: String = format!("{SESSION_KEY_PREFIX}:{token}");

        let _: () = redis::cmd("SET")
            .arg(&key)
            .arg(session_data)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .context("Failed to create session in Redis")?;

        Ok(())
    }
}

fn user_key(user_id: i64) -> String {
    format!("{USER_KEY_PREFIX}:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(user_key(42), "user:42");
    }

    #[test]
    fn client_accepts_configured_url_without_connecting() {
        let env: EnvironmentVariables = EnvironmentVariables::from_map(&Default::default()).unwrap();
        assert!(RedisService::new(Arc::new(env)).is_ok());
    }
}
