// Application server configuration and setup

use std::time::Duration;
use axum::{
    Router,
    routing::get,
    middleware::from_fn,
    extract::DefaultBodyLimit,
    error_handling::HandleErrorLayer,
    http::Uri,
};
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tokio::{signal, net::TcpListener};
use listenfd::ListenFd;
use anyhow::Result;
use tracing::{error, info};

use crate::api::{
    conduct_routes, cycle_routes, diagnostics_routes, organisation_routes, system_routes,
};
use crate::config::{environment::EnvironmentVariables, state::AppState};
use crate::realtime::socket::ws_handler;
use crate::utils::{
    ApiError,
    error_handler::handle_global_error,
    response_handler::response_wrapper,
};

/// Creates the application router from the singleton state
pub fn create_app() -> Router {
    build_router(AppState::instance().clone())
}

/// Assembles every route with the middleware stack. `/ws` is merged after the
/// layers so upgrade responses bypass the JSON envelope and request timeout.
pub fn build_router(state: AppState) -> Router {
    build_router_with(state, Router::new())
}

/// Same as [`build_router`], with `extra` mounted behind the middleware stack.
pub fn build_router_with(state: AppState, extra: Router<AppState>) -> Router {
    let env: &EnvironmentVariables = &state.environment;
    let timeout: Duration = Duration::from_secs(env.default_timeout_seconds);
    let body_limit: usize = env.max_request_body_size;

    let realtime: Router<AppState> = Router::new().route("/ws", get(ws_handler));

    Router::new()
        .merge(system_routes())
        .merge(organisation_routes())
        .merge(conduct_routes())
        .merge(cycle_routes())
        .merge(diagnostics_routes())
        // Add new routes here
        .merge(extra)
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(response_wrapper))
                .layer(HandleErrorLayer::new(handle_global_error))
                .layer(TimeoutLayer::new(timeout))
                .layer(DefaultBodyLimit::max(body_limit))
        )
        .merge(realtime)
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

/// Sets up the TCP listener from environment or binds to new address
pub async fn setup_listener(env: &EnvironmentVariables) -> Result<TcpListener> {
    let mut listenfd: ListenFd = ListenFd::from_env();

    let listener: TcpListener = match listenfd.take_tcp_listener(0)? {
        Some(std_listener) => {
            std_listener.set_nonblocking(true)?;
            TcpListener::from_std(std_listener)?
        }
        None => {
            let addr: String = format!("{}:{}", env.host, env.port);
            TcpListener::bind(&addr).await?
        }
    };

    Ok(listener)
}

/// Resolves on Ctrl+C or TERM. A handler that cannot be installed never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install TERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate: std::future::Pending<()> = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutting down via Ctrl+C"),
        _ = terminate => info!("Shutting down via TERM signal"),
    }
}
