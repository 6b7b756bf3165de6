//! tests/endpoints/validation.rs
//! Request shapes rejected by extractors or handlers before touching storage.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn unknown_access_type_is_a_bad_request() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/view_conducts", base_url))
        .json(&json!({ "access_type": "platoon" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["messages"][0], "Invalid access type selected.");
}

#[tokio::test]
async fn unknown_password_type_is_a_bad_request() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/change_password", base_url))
        .json(&json!({ "password_type": "platoon" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_path_ids_are_rejected() {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .get(format!("{}/battalion_overview/abc", base_url))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert!(!body["messages"].as_array().unwrap().is_empty());
}

async fn post_json(path: &str, payload: Value) -> (StatusCode, Value) {
    let base_url: String = common::spawn_app();

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}{}", base_url, path))
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request.");

    let status: StatusCode = resp.status();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn malformed_pins_are_rejected() {
    for pin in ["12345", "12345a", "1234567", "   ", ""] {
        let (status, body) = post_json("/join_conduct", json!({ "pin": pin })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "pin {pin:?}");
        assert_eq!(body["messages"][0], "Please enter a valid 6-digit PIN");
    }

    let (status, _) = post_json("/join_conduct", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_conduct_requires_every_field() {
    let (status, body) = post_json(
        "/create_conduct",
        json!({
            "battalion_name": "1 SIR",
            "company_name": "  ",
            "conduct_name": "Route march",
            "company_password": "secret1"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["messages"][0], "All fields are required.");
}

#[tokio::test]
async fn mismatched_new_passwords_are_rejected() {
    let (status, body) = post_json(
        "/change_password",
        json!({
            "password_type": "battalion",
            "battalion_name": "1 SIR",
            "current_password": "oldpass",
            "new_password": "newpass1",
            "confirm_password": "newpass2"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["messages"][0], "New passwords do not match.");
}

#[tokio::test]
async fn short_new_passwords_are_rejected() {
    let (status, body) = post_json(
        "/change_password",
        json!({
            "password_type": "company",
            "battalion_name": "1 SIR",
            "company_name": "Alpha",
            "current_password": "oldpass",
            "new_password": "abc",
            "confirm_password": "abc"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["messages"][0], "Password must be at least 6 characters long.");
}

#[tokio::test]
async fn deleting_nothing_is_a_bad_request() {
    let (status, body) = post_json("/delete_conducts/1", json!({ "conduct_ids": [] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["messages"][0], "No conducts selected for deletion.");
}
