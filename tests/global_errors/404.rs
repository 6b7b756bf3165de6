//! tests/global_errors/404.rs
//! Unknown routes answer 404 inside the JSON envelope.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_404_for_nonexistent_route() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/does-not-exist", base_url))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "NOT_FOUND");
    assert_eq!(json["code"], 404);
    assert_eq!(json["data"]["error"], "not_found");
    assert_eq!(json["messages"][0], "No route for /does-not-exist");
    assert!(json["date"].is_string());
}
