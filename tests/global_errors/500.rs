//! tests/global_errors/500.rs
//! Infrastructure failures surface as a generic 500 without internals.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_500_when_database_is_unavailable() {
    // The test app never initializes the pool
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/get_conduct_history/1", base_url))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "INTERNAL_SERVER_ERROR");
    assert_eq!(json["data"]["error"], "internal_error");
    assert_eq!(json["messages"][0], "Internal server error");
}
