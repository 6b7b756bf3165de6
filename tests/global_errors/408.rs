//! tests/global_errors/408.rs
//! Ensures that requests taking too long result in a 408 timeout.

#[path = "../mod.rs"]
mod common;

use std::collections::HashMap;
use std::time::Duration;

use axum::{routing::get, Router};
use reqwest::StatusCode;
use serde_json::Value;
use thermopal::config::state::AppState;
use tokio::time::timeout;

async fn slow_handler() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "too late"
}

#[tokio::test]
async fn returns_408_when_request_times_out() {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("DEFAULT_TIMEOUT_SECONDS".into(), "1".into());
    let slow: Router<AppState> = Router::new().route("/slow", get(slow_handler));

    let base_url: String = common::spawn_app_with(vars, slow);

    let resp_result: Result<Result<reqwest::Response, reqwest::Error>, tokio::time::error::Elapsed> = timeout(
        Duration::from_secs(5), // client-side timeout duration
        async {
            reqwest::Client::new()
                .get(format!("{}/slow", base_url))
                .send()
                .await
        }
    )
    .await;

    // Ensure the client did not timeout waiting for a response.
    assert!(resp_result.is_ok(), "Client timed out waiting for server.");

    let resp: reqwest::Response = resp_result.unwrap().expect("Request failed unexpectedly.");

    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "REQUEST_TIMEOUT");
    assert_eq!(json["code"], 408);
}
