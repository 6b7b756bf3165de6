//! tests/global_errors/422.rs
//! Payloads that do not deserialize are refused before any service runs.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn unknown_zone_is_unprocessable() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/set_zone", base_url))
        .json(&json!({ "user_id": 1, "zone": "purple" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 422);
    // * The extractor's rejection text is kept as a message
    let message: &str = body["messages"][0].as_str().unwrap_or_default();
    assert!(message.contains("zone"), "unexpected message: {message}");
}

#[tokio::test]
async fn missing_user_id_is_unprocessable() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/stop_cycle", base_url))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
