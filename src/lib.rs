// Library root for the Thermopal heat-stress cycle tracker

pub mod api;
pub mod config;
pub mod core;
pub mod database;
pub mod domain;
pub mod models;
pub mod realtime;
pub mod services;
pub mod utils;

pub use crate::config::environment::EnvironmentVariables;
pub use crate::config::state::AppState;
pub use crate::core::server::build_router;
