//! tests/endpoints/system.rs
//! Banner, clock sync, system status and health.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

async fn get_json(url: String) -> (StatusCode, Value) {
    let resp: reqwest::Response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .expect("Failed to execute request.");
    let status: StatusCode = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn banner_lists_the_zone_table() {
    let base_url: String = common::spawn_app();
    let (status, json) = get_json(format!("{}/", base_url)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "OK");
    assert_eq!(json["data"]["service"], "thermopal");
    assert_eq!(json["data"]["environment"], "development");
    assert_eq!(json["data"]["zones"]["red"]["work"], 30.0);
    assert_eq!(json["data"]["zones"]["black"]["rest"], 30.0);
}

#[tokio::test]
async fn server_time_is_a_recent_utc_epoch() {
    let base_url: String = common::spawn_app();
    let (status, json) = get_json(format!("{}/get_server_time", base_url)).await;

    assert_eq!(status, StatusCode::OK);
    let timestamp: f64 = json["data"]["timestamp"].as_f64().unwrap();
    let now: f64 = chrono::Utc::now().timestamp() as f64;
    assert!((now - timestamp).abs() < 60.0, "server time {timestamp} far from {now}");
}

#[tokio::test]
async fn system_status_defaults_to_no_cut_off() {
    let base_url: String = common::spawn_app();

    for path in ["/get_system_status", "/get_system_status?conduct_id=42"] {
        let (status, json) = get_json(format!("{}{}", base_url, path)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["cut_off"], false);
        assert!(json["data"]["cut_off_end_time"].is_null());
    }
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let base_url: String = common::spawn_app();
    let (status, json) = get_json(format!("{}/health", base_url)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["database"], "disconnected");
    assert!(json["data"]["instance_id"].is_string());
}
