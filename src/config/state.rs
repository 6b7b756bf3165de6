// Application state management with singleton pattern

use std::sync::Arc;
use once_cell::sync::Lazy;
use crate::config::environment::EnvironmentVariables;
use crate::database::{DatabaseService, RedisService};
use crate::domain::{Clock, ConductStatusRegistry};
use crate::realtime::RealtimeHub;

// AppState singleton
#[derive(Debug, Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub database: DatabaseService,
    pub redis: RedisService,
    /// In-memory cut-off state per conduct
    pub statuses: ConductStatusRegistry,
    pub realtime: RealtimeHub,
    pub clock: Clock,
}

impl AppState {
    /// Builds the state from an already loaded configuration. Nothing connects yet.
    pub fn from_environment(environment: EnvironmentVariables) -> anyhow::Result<Self> {
        let environment_arc: Arc<EnvironmentVariables> = Arc::new(environment);

        // Create services
        let database: DatabaseService = DatabaseService::new(environment_arc.clone());
        let redis: RedisService = RedisService::new(environment_arc.clone())?;
        let clock: Clock = Clock::from_name(&environment_arc.timezone)?;

        Ok(Self {
            environment: environment_arc,
            database,
            redis,
            statuses: ConductStatusRegistry::new(),
            realtime: RealtimeHub::default(),
            clock,
        })
    }

    /// Creates a new AppState instance from the configuration singleton (private constructor)
    fn new() -> anyhow::Result<Self> {
        let environment: EnvironmentVariables = EnvironmentVariables::instance().clone();
        Self::from_environment(environment)
    }

    /// Returns the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: Lazy<AppState> = Lazy::new(|| {
            AppState::new().expect("Failed to initialize AppState")
        });
        &INSTANCE
    }

    /// Connects Postgres (running the schema script) and Redis
    pub async fn init_services() -> anyhow::Result<()> {
        let instance: &'static AppState = Self::instance();

        instance.database.initialize().await?;
        instance.redis.initialize().await?;

        tracing::info!("Services (DB + Redis) initialized successfully");
        Ok(())
    }

    /// Gracefully shutdown all connections
    pub async fn shutdown() {
        let instance: &'static AppState = Self::instance();
        instance.database.shutdown().await;
        instance.redis.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_builds_without_connecting() {
        let env: EnvironmentVariables = EnvironmentVariables::from_map(&Default::default()).unwrap();
        let state: AppState = AppState::from_environment(env).unwrap();
        assert_eq!(state.clock.timezone(), chrono_tz::Asia::Singapore);
        assert!(state.database.get_pool().is_err());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let mut vars: std::collections::HashMap<String, String> = Default::default();
        vars.insert("TIMEZONE".into(), "Mars/Olympus".into());
        let env: EnvironmentVariables = EnvironmentVariables::from_map(&vars).unwrap();
        assert!(AppState::from_environment(env).is_err());
    }
}
