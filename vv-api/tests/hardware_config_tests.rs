//! Integration tests for hardware, rear input, input configuration,
//! recording and virtual channel endpoints

mod helpers;

use axum::http::StatusCode;
use helpers::{extract_json, json_request, test_request, TestApp};
use serde_json::json;
use vv_api::vendor::{InputSetting, SimState};

// =============================================================================
// Hardware
// =============================================================================

#[tokio::test]
async fn test_hardware_identification() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/gethardwareinputchannels").await).await;
    assert_eq!(body["data"]["result"], 4);
    assert_eq!(body["message"], "Hardware input channels: 4");

    let body = extract_json(app.get("/api/gethardwareoutputchannels").await).await;
    assert_eq!(body["data"]["result"], 2);

    let body = extract_json(app.get("/api/gethardwareserialnumber").await).await;
    assert_eq!(body["data"]["result"], "VR9500-10234");

    let body = extract_json(app.get("/api/getsoftwareversion").await).await;
    assert_eq!(body["data"]["result"], "2025.1.0");
}

#[tokio::test]
async fn test_hardware_capabilities_use_one_based_channels() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/hardwaresupportscapacitorcoupled?2").await).await;
    assert_eq!(body["data"]["result"], true);
    assert_eq!(body["data"]["channel"], 2);
    assert_eq!(body["data"]["internal_channel"], 1);
    assert!(app
        .connector
        .calls()
        .contains(&"HardwareSupportsCapacitorCoupled(1)".to_string()));

    let body = extract_json(app.get("/api/hardwaresupportsdifferential?channel=1").await).await;
    assert_eq!(body["data"]["result"], false);
    assert_eq!(body["message"], "Channel 1 differential support: false");
}

#[tokio::test]
async fn test_hardware_capability_errors() {
    let app = TestApp::new();

    let response = app.get("/api/hardwaresupportsaccelpowersource?0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"]["code"], "INVALID_PARAMETER");

    let response = app.get("/api/hardwaresupportsaccelpowersource").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"]["code"], "MISSING_PARAMETER");
    assert!(app.connector.calls().is_empty());

    // Past the hardware channel count the controller itself refuses
    let response = app.get("/api/hardwaresupportsaccelpowersource?9").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(extract_json(response).await["error"]["details"]["com_error"].is_object());
}

// =============================================================================
// Rear inputs
// =============================================================================

#[tokio::test]
async fn test_rear_inputs() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/rearinput").await).await;
    assert_eq!(body["data"]["result"], json!([0.25, 4.75]));
    assert_eq!(body["message"], "Retrieved 2 rear input values");

    let body = extract_json(app.get("/api/rearinputunit?2").await).await;
    assert_eq!(body["data"]["result"], "degC");
    assert_eq!(body["data"]["channel"], 2);
    assert_eq!(body["data"]["internal_channel"], 1);

    let body = extract_json(app.get("/api/rearinputlabel?channel=1").await).await;
    assert_eq!(body["data"]["result"], "Rear 1");
    assert!(app.connector.calls().contains(&"RearInputLabel(0)".to_string()));
}

#[tokio::test]
async fn test_rear_input_rejects_channel_zero() {
    let app = TestApp::new();

    let response = app.get("/api/rearinputunit?0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_PARAMETER");
    assert_eq!(body["error"]["message"], "channel must be >= 1 (1-based indexing), got 0");
    assert!(!app.connector.calls().iter().any(|c| c.starts_with("RearInputUnit")));
}

#[tokio::test]
async fn test_rear_input_nan_becomes_null() {
    let app = TestApp::with_state(SimState {
        rear_inputs: vec![f64::NAN, 1.0],
        ..Default::default()
    });

    let body = extract_json(app.get("/api/rearinput").await).await;
    assert_eq!(body["data"]["result"], json!([null, 1.0]));
}

// =============================================================================
// Input configuration
// =============================================================================

#[tokio::test]
async fn test_input_engineering_scale() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/inputengineeringscale?3").await).await;
    assert_eq!(body["data"]["result"], 2.5);
    assert_eq!(body["data"]["channel"], 3);
    assert!(app.connector.calls().contains(&"InputEngineeringScale(2)".to_string()));
}

#[tokio::test]
async fn test_input_setting_read_and_write() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/inputcapacitorcoupled?1").await).await;
    assert_eq!(body["data"]["result"], false);

    let response = app.send(test_request("POST", "/api/inputcapacitorcoupled?1&true")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["data"]["value_set"], true);
    assert_eq!(body["message"], "Channel 1 capacitor coupled set to true, returned: true");
    assert!(app
        .connector
        .calls()
        .contains(&"InputCapacitorCoupled(0, true)".to_string()));

    // GET only reads, even with a value
    let body = extract_json(app.get("/api/inputcapacitorcoupled?1&false").await).await;
    assert_eq!(body["data"]["result"], true);
    assert!(body["data"].get("value_set").is_none());
}

#[tokio::test]
async fn test_input_setting_by_name() {
    let app = TestApp::new();

    let response = app
        .send(test_request("POST", "/api/inputaccelpowersource?channel=2&value=true"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.connector.state().input_settings.get(&(InputSetting::AccelPowerSource, 1)),
        Some(&true)
    );
}

#[tokio::test]
async fn test_input_setting_errors() {
    let app = TestApp::new();

    let response = app.send(test_request("POST", "/api/inputdifferential?1&maybe")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["error"]["message"],
        "Invalid value parameter - must be true or false"
    );
    assert!(app.connector.calls().is_empty());

    // The simulated hardware has no differential inputs
    let response = app.send(test_request("POST", "/api/inputdifferential?1&true")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(extract_json(response).await["error"]["code"], "UPSTREAM_FAILURE");
}

#[tokio::test]
async fn test_input_mode() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/api/inputmode",
            &json!({"channel": 2, "powersource": true, "capcoupled": false, "differential": true}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["data"]["channel"], 2);
    assert_eq!(body["data"]["powersource"], true);
    assert_eq!(body["data"]["capcoupled"], false);
    assert_eq!(body["message"], "Channel 2 input mode configured successfully");

    let state = app.connector.state();
    assert_eq!(state.input_settings.get(&(InputSetting::Differential, 1)), Some(&true));
    assert_eq!(state.input_settings.get(&(InputSetting::CapacitorCoupled, 1)), Some(&false));
}

#[tokio::test]
async fn test_input_mode_validation() {
    let app = TestApp::new();

    let response = app
        .send(json_request("POST", "/api/inputmode", &json!({"channel": 1, "powersource": true})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["error"]["message"],
        "Missing required parameters: capcoupled, differential"
    );

    let response = app.send(test_request("POST", "/api/inputmode")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"]["message"], "Missing JSON body");

    let response = app
        .send(json_request(
            "POST",
            "/api/inputmode",
            &json!({"channel": 0, "powersource": true, "capcoupled": true, "differential": false}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.connector.calls().is_empty());
}

#[tokio::test]
async fn test_input_calibration_from_query() {
    let app = TestApp::new();

    let response = app
        .get("/api/inputcalibration?channel=1&sensitivity=98.5&serialnumber=SN123&caldate=1/1/2024")
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response).await;
    assert_eq!(body["data"]["sensitivity"], 98.5);
    assert_eq!(body["data"]["serialnumber"], "SN123");
    assert_eq!(body["data"]["caldate"], "1/1/2024");

    let state = app.connector.state();
    assert_eq!(state.sensitivities[0], 98.5);
    assert_eq!(state.serial_numbers[0], "SN123");
}

#[tokio::test]
async fn test_input_calibration_from_json() {
    let app = TestApp::new();

    let response = app
        .send(json_request(
            "POST",
            "/api/inputcalibration",
            &json!({"channel": 2, "sensitivity": 10.2, "serialnumber": "LW9", "caldate": "2025-01-31"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.connector.state().cal_dates[1], "2025-01-31");

    let response = app
        .send(json_request(
            "POST",
            "/api/inputcalibration",
            &json!({"channel": 2, "sensitivity": "abc", "serialnumber": "LW9", "caldate": "2025-01-31"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"]["code"], "INVALID_PARAMETER");
}

#[tokio::test]
async fn test_input_configuration_file_by_name() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/inputconfigurationfile").await).await;
    assert_eq!(body["data"]["result"], "Default.vic");

    let response = app
        .send(test_request("POST", "/api/inputconfigurationfile?10mv%20per%20G.vic"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["data"]["configName"], "10mv per G.vic");
    assert_eq!(app.connector.state().input_configuration_file, "10mv per G.vic");

    let response = app.send(test_request("POST", "/api/inputconfigurationfile")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Recording
// =============================================================================

#[tokio::test]
async fn test_recording_cycle() {
    let app = TestApp::new();

    // Nothing to record until a test runs
    let body = extract_json(app.get("/api/recordstart").await).await;
    assert_eq!(body["data"]["result"], false);

    app.send(test_request("POST", "/api/starttest")).await;
    let body = extract_json(app.send(test_request("POST", "/api/recordstart")).await).await;
    assert_eq!(body["data"]["result"], true);
    assert_eq!(body["message"], "RecordStart command executed");

    let body = extract_json(app.get("/api/recordpause").await).await;
    assert_eq!(body["data"]["result"], true);

    let body = extract_json(app.get("/api/recordstop").await).await;
    assert_eq!(body["data"]["result"], true);
    let body = extract_json(app.get("/api/recordstop").await).await;
    assert_eq!(body["data"]["result"], false);

    let body = extract_json(app.get("/api/recordgetfilename").await).await;
    assert!(body["data"]["result"].as_str().unwrap().ends_with(".vrd"));
    assert_eq!(body["data"]["executed"], true);
}

// =============================================================================
// Virtual channels
// =============================================================================

#[tokio::test]
async fn test_virtual_channels_by_name() {
    let app = TestApp::new();

    let body = extract_json(app.get("/api/importvirtualchannels?channels.vchan").await).await;
    assert_eq!(body["data"]["filepath"], "channels.vchan");

    // POST without a body imports by name too
    let response = app
        .send(test_request("POST", "/api/importvirtualchannels?filename=more.vchan"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.connector.state().virtual_channels,
        vec!["channels.vchan".to_string(), "more.vchan".to_string()]
    );

    let body = extract_json(app.send(test_request("POST", "/api/removeallvirtualchannels")).await).await;
    assert_eq!(body["data"]["result"], true);
    assert!(app.connector.state().virtual_channels.is_empty());

    let response = app.get("/api/importvirtualchannels").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
