// Start of file: /src/config/environment.rs

// * Environment configuration loaded once through a lazy singleton.
// * Every key has a default so `cargo run` works with an empty .env.

use std::{borrow::Cow, collections::HashMap};
// * anyhow for convenient error handling
use anyhow::{Context, Result};
// * once_cell for lazy static initialization
use once_cell::sync::Lazy;
use tracing::warn;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "thermopal";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_TIMEZONE: &str = "Asia/Singapore";
const DEFAULT_CONDUCTING_BODY_PASSWORD: &str = "password";
const DEFAULT_BATTALION_PASSWORD: &str = "test123";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 5; // 5 seconds
const DEFAULT_DB_PORT: u16 = 5432; // Default Postgres port
const DEFAULT_USER_CACHE_TTL: u64 = 30;
const DEFAULT_SESSION_TTL: u64 = 86_400; // 24 hours
const DEFAULT_CYCLE_CHECK_INTERVAL: u64 = 1;
const DEFAULT_CONDUCT_CHECK_INTERVAL: u64 = 60;
const DEFAULT_CONDUCT_INACTIVITY_HOURS: i64 = 24;

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub protocol: Cow<'static, str>,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    pub database_url: Option<String>,
    pub db_host: Cow<'static, str>,
    pub db_port: u16,
    pub db_user: Cow<'static, str>,
    pub db_password: Cow<'static, str>,
    pub db_name: Cow<'static, str>,
    pub redis_url: Cow<'static, str>,
    pub timezone: Cow<'static, str>,
    pub conducting_body_password: Cow<'static, str>,
    pub default_battalion_password: Cow<'static, str>,
    pub user_cache_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
    pub cycle_check_interval_seconds: u64,
    pub conduct_check_interval_seconds: u64,
    pub conduct_inactivity_hours: i64,
}

impl EnvironmentVariables {
    // * Loads environment variables.
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        // * Collect all environment vars from the system and .env
        let vars: HashMap<String, String> = std::env::vars()
            .chain(dotenv::vars())
            .collect();

        Self::from_map(&vars)
    }

    // * Builds the configuration from an explicit key/value map, providing defaults if missing
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        let get_var = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let owned_or = |key: &str, default: &'static str| -> Cow<'static, str> {
            get_var(key)
                .map(|s| Cow::Owned(s.to_string()))
                .unwrap_or(Cow::Borrowed(default))
        };

        let owned_or_warn = |key: &str, default: &'static str| -> Cow<'static, str> {
            get_var(key)
                .map(|s| Cow::Owned(s.to_string()))
                .unwrap_or_else(|| {
                    warn!("Missing {key}, defaulting to '{default}'");
                    Cow::Borrowed(default)
                })
        };

        let database_url: Option<String> = get_var("DATABASE_URL").map(str::to_string);
        if database_url.is_none() {
            warn!("DATABASE_URL not set, connecting with DB_* variables");
        }

        Ok(Self {
            environment: owned_or_warn("ENVIRONMENT", DEFAULT_ENVIRONMENT),
            host: owned_or("HOST", DEFAULT_HOST),

            port: get_var("PORT")
                .map(|s| s.parse().context("Invalid PORT value"))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),

            protocol: owned_or("PROTOCOL", DEFAULT_PROTOCOL),

            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            db_host: if database_url.is_some() {
                owned_or("DB_HOST", DEFAULT_DB_HOST)
            } else {
                owned_or_warn("DB_HOST", DEFAULT_DB_HOST)
            },

            db_port: get_var("DB_PORT")
                .map(|s| s.parse().context("Invalid DB_PORT"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_PORT),

            db_user: owned_or("DB_USER", DEFAULT_DB_USER),
            db_password: owned_or("DB_PASSWORD", DEFAULT_DB_PASSWORD),
            db_name: owned_or("DB_NAME", DEFAULT_DB_NAME),
            database_url,

            redis_url: owned_or_warn("REDIS_URL", DEFAULT_REDIS_URL),
            timezone: owned_or("TIMEZONE", DEFAULT_TIMEZONE),

            conducting_body_password: owned_or_warn(
                "CONDUCTING_BODY_PASSWORD",
                DEFAULT_CONDUCTING_BODY_PASSWORD,
            ),
            default_battalion_password: owned_or_warn(
                "DEFAULT_BATTALION_PASSWORD",
                DEFAULT_BATTALION_PASSWORD,
            ),

            user_cache_ttl_seconds: get_var("USER_CACHE_TTL_SECONDS")
                .map(|s| s.parse().context("Invalid USER_CACHE_TTL_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_USER_CACHE_TTL),

            session_ttl_seconds: get_var("SESSION_TTL_SECONDS")
                .map(|s| s.parse().context("Invalid SESSION_TTL_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_SESSION_TTL),

            cycle_check_interval_seconds: get_var("CYCLE_CHECK_INTERVAL_SECONDS")
                .map(|s| s.parse().context("Invalid CYCLE_CHECK_INTERVAL_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_CYCLE_CHECK_INTERVAL)
                .max(1),

            conduct_check_interval_seconds: get_var("CONDUCT_CHECK_INTERVAL_SECONDS")
                .map(|s| s.parse().context("Invalid CONDUCT_CHECK_INTERVAL_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_CONDUCT_CHECK_INTERVAL)
                .max(1),

            conduct_inactivity_hours: get_var("CONDUCT_INACTIVITY_HOURS")
                .map(|s| s.parse().context("Invalid CONDUCT_INACTIVITY_HOURS"))
                .transpose()?
                .unwrap_or(DEFAULT_CONDUCT_INACTIVITY_HOURS),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    // * Returns a reference to the lazily-initialized environment configuration
    pub fn instance() -> &'static Self {
        static INSTANCE: Lazy<Result<EnvironmentVariables, anyhow::Error>> = Lazy::new(|| {
            let config: EnvironmentVariables = EnvironmentVariables::load()?;

            if cfg!(debug_assertions) {
                tracing::debug!("Loaded environment configuration: {:#?}", config);
            }

            Ok(config)
        });

        // ! Panics if loading fails
        INSTANCE.as_ref().expect("Failed to load environment configuration")
    }
}


// End of file: /src/config/environment.rs
