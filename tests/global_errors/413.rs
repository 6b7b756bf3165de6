//! tests/global_errors/413.rs
//! A JSON body over the default 2 MiB limit is refused with 413.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn returns_413_when_payload_exceeds_global_limit() {
    let base_url: String = common::spawn_app();

    let mut oversized_payload: Vec<u8> = b"{\"conduct_name\":\"".to_vec();
    oversized_payload.extend(std::iter::repeat(b'X').take(2_097_152 + 100));
    oversized_payload.extend_from_slice(b"\"}");

    let resp: reqwest::Response = reqwest::Client::new()
        .post(format!("{}/create_conduct", base_url))
        .header("content-type", "application/json")
        .body(oversized_payload)
        .send()
        .await
        .expect("Failed to send large request.");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "PAYLOAD_TOO_LARGE");
    assert_eq!(json["code"], 413);
}
