//! Integration tests for the TEDS routes

mod helpers;

use axum::http::StatusCode;
use helpers::{extract_json, json_request, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_input_teds_counts_channels() {
    let app = TestApp::new();

    let response = app.get("/api/inputteds").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    let data = &body["data"];
    assert_eq!(data["total_channels"], 4);
    assert_eq!(data["channels_with_teds"], 2);
    assert_eq!(data["channels_with_errors"], 1);
    assert_eq!(data["channels_with_teds_enabled"], 3);
    assert_eq!(data["result"][0]["channel"], 1);
}

#[tokio::test]
async fn test_input_teds_channel() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/inputtedschannel?2").await).await;
    assert_eq!(body["data"]["channel"], 2);
    assert_eq!(body["data"]["internal_channel"], 1);
    assert!(app.connector.calls().contains(&"Teds(1)".to_string()));
}

#[tokio::test]
async fn test_channel_out_of_range() {
    let app = TestApp::new();

    let response = app.get("/api/inputtedschannel?5").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Channel 5 out of range - must be 1 to 4 (1-based)");

    let response = app.get("/api/teds?0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_formatted_teds_for_channel() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/teds?1").await).await;
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["data"]["channel"], 1);
    let fields = &body["data"]["transducer"];
    assert!(fields.get("channel").is_none());
    assert_eq!(fields["serial_number"], "LW12345");

    let body = extract_json(app.get("/api/teds?3").await).await;
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["data"]["error"]["error"], "TEDS read failed");
}

#[tokio::test]
async fn test_formatted_teds_for_all_channels() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/teds").await).await;
    assert_eq!(body["data"]["channel"], "all");
    assert_eq!(body["data"]["result"]["transducers"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["result"]["errors"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["result"]["transducers"][1]["channel"], 2);
}

#[tokio::test]
async fn test_teds_read_operations() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/tedsread").await).await;
    assert_eq!(body["data"]["success"], true);

    let response = app.send(helpers::test_request("POST", "/api/tedsreadandapply")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.connector.calls().contains(&"TedsReadAndApply".to_string()));
}

#[tokio::test]
async fn test_verify_and_apply() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/api/tedsverifyandapply",
            &json!({"urns": ["URN-0001", "URN-0404"]}),
        ))
        .await;
    let body = extract_json(response).await;
    assert_eq!(body["data"]["urn_count"], 2);
    assert_eq!(body["data"]["result"], json!([true, false]));

    let response = app
        .send(json_request("POST", "/api/tedsverifyandapply", &json!({"urns": []})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_teds_from_urn() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/tedsfromurn?URN-0001").await).await;
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["data"]["urn"], "URN-0001");
    assert_eq!(body["data"]["transducer"]["model_number"], "356A45");

    let body = extract_json(app.get("/api/tedsfromurn?urn=URN-0404").await).await;
    assert_eq!(body["data"]["success"], false);
    assert_eq!(body["data"]["error"]["error"], "URN URN-0404 not found");
}
