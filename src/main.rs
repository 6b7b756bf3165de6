// Start of file: /src/main.rs

use axum::{Router, serve};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::info;

use thermopal::config::state::AppState;
use thermopal::core::logging::init_tracing;
use thermopal::core::server::{create_app, setup_listener, shutdown_signal};
use thermopal::services::monitor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // * Connect Postgres (schema included) and Redis before accepting traffic
    AppState::init_services().await?;
    let state: &'static AppState = AppState::instance();

    let monitor_task: JoinHandle<()> = monitor::spawn(state.clone());

    let app: Router = create_app();
    let listener: TcpListener = setup_listener(&state.environment).await?;

    info!(
        "Server listening on: {}://{}",
        state.environment.protocol,
        listener.local_addr()?
    );

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor_task.abort();
    AppState::shutdown().await;

    Ok(())
}

// End of file: /src/main.rs
