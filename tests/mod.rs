//! tests/mod.rs
//! A shared test helper to spawn the Axum app on an ephemeral port.

use std::collections::HashMap;

use axum::{serve, Router};
use thermopal::config::{environment::EnvironmentVariables, state::AppState};
use thermopal::core::server::build_router_with;
use tokio::net::TcpListener as TokioTcpListener;

/// Spawns the app on a random unused port and returns its base URL.
/// Nothing connects to Postgres or Redis until a route needs them.
pub fn spawn_app() -> String {
    // * Defaults only, so local .env files do not leak into tests
    spawn_app_with(HashMap::new(), Router::new())
}

/// Spawns the app with configuration overrides and extra routes mounted
/// behind the usual middleware stack.
#[allow(dead_code)]
pub fn spawn_app_with(vars: HashMap<String, String>, extra: Router<AppState>) -> String {
    let env: EnvironmentVariables = EnvironmentVariables::from_map(&vars)
        .expect("Configuration must load");
    let state: AppState = AppState::from_environment(env).expect("Failed to build AppState");

    let app: Router = build_router_with(state, extra);

    let std_listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    let tokio_listener: TokioTcpListener = TokioTcpListener::from_std(std_listener)
        .expect("Failed to convert to tokio listener");

    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    tokio::spawn(async move {
        serve(tokio_listener, app)
            .await
            .expect("Server failed");
    });

    format!("http://{}", addr)
}
