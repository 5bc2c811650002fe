//! Basic test control: start, stop, resume, open, run and close tests

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::params::QueryParams;
use crate::response::success;
use crate::upload::{is_default_template_filename, is_template_file, save_upload, RawUpload};
use crate::AppState;

fn required_test_name(params: &QueryParams) -> ApiResult<String> {
    params.named_or_whole("testname").ok_or_else(|| {
        ApiError::MissingParameter(
            "Missing required query parameter: testname (or unnamed test filename parameter)".to_string(),
        )
    })
}

/// GET|POST /api/starttest
pub async fn start_test(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.start_test()?)).await?;
    Ok(success(json!({ "result": result }), "StartTest command executed"))
}

/// GET|POST /api/stoptest
pub async fn stop_test(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.stop_test()?)).await?;
    Ok(success(json!({ "result": result }), "StopTest command executed"))
}

/// GET|POST /api/resumetest
pub async fn resume_test(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.resume_test()?)).await?;
    Ok(success(json!({ "result": result }), "ResumeTest command executed"))
}

/// GET|POST /api/opentest?testname=<path> or /api/opentest?<path>
pub async fn open_test(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let test_name = required_test_name(&params)?;
    let path = test_name.clone();
    let result = state.with_session(move |vv| Ok(vv.open_test(&path)?)).await?;

    Ok(success(
        json!({ "result": result, "filepath": test_name }),
        format!("OpenTest command executed: {}", test_name),
    ))
}

/// PUT /api/opentest?filename=<name> with the profile as the raw body
///
/// Templates go to the new-test-defaults folder when one is configured.
/// Stock template names are copied into place without being opened.
pub async fn upload_and_open_test(
    State(state): State<AppState>,
    RawUpload(upload): RawUpload,
) -> ApiResult<Json<Value>> {
    let filename = upload.filename;
    let folder = if is_template_file(&filename) {
        state.config.new_test_defaults_folder.clone()
    } else {
        None
    };
    let saved = save_upload(&state.config, &filename, &upload.bytes, folder.as_deref(), false).await?;

    if is_default_template_filename(&filename) {
        info!("Default template copied without opening: {}", filename);
        return Ok(success(
            json!({
                "result": true,
                "filepath": filename,
                "executed": false,
                "copied_only": true,
            }),
            format!(
                "Default template file uploaded and copied only (OpenTest automation not run on default filename): {}",
                filename
            ),
        ));
    }

    let path = saved.file_path.display().to_string();
    state.with_session(move |vv| Ok(vv.open_test(&path)?)).await?;

    Ok(success(
        json!({ "result": true, "filepath": filename, "executed": true }),
        format!("OpenTest command executed successfully: {}", filename),
    ))
}

/// GET|POST /api/runtest?testname=<path> or /api/runtest?<path>
pub async fn run_test(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let test_name = required_test_name(&params)?;
    let path = test_name.clone();
    let result = state.with_session(move |vv| Ok(vv.run_test(&path)?)).await?;

    Ok(success(
        json!({ "result": result, "filepath": test_name }),
        format!("RunTest command executed: {}", test_name),
    ))
}

/// PUT /api/runtest?filename=<name>: upload, open and start in one call
pub async fn upload_and_run_test(
    State(state): State<AppState>,
    RawUpload(upload): RawUpload,
) -> ApiResult<Json<Value>> {
    let filename = upload.filename;
    let saved = save_upload(&state.config, &filename, &upload.bytes, None, false).await?;

    let path = saved.file_path.display().to_string();
    let running = state
        .with_session(move |vv| {
            vv.run_test(&path)?;
            Ok(vv.is_running()?)
        })
        .await?;

    Ok(success(
        json!({
            "result": running,
            "filepath": filename,
            "file_uploaded": true,
            "test_opened": true,
            "test_started": running,
            "executed": true,
        }),
        format!(
            "Upload and RunTest command {}: {}",
            if running { "executed successfully" } else { "failed" },
            filename
        ),
    ))
}

/// GET|POST /api/closetest?profilename=<name> or /api/closetest?<name>
pub async fn close_test(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let profile_name = params.named_or_whole("profilename").ok_or_else(|| {
        ApiError::MissingParameter(
            "Missing required query parameter: profilename (or unnamed profile name parameter)".to_string(),
        )
    })?;

    let name = profile_name.clone();
    let closed = state.with_session(move |vv| Ok(vv.close_test(&name)?)).await?;

    Ok(success(
        json!({ "test_was_closed": closed, "profile_name": profile_name }),
        format!("CloseTest command executed: {}", profile_name),
    ))
}

/// GET|POST /api/closetab?tabindex=<n> (0-based)
pub async fn close_tab(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let raw = params
        .get("tabindex")
        .ok_or_else(|| ApiError::MissingParameter("Missing required query parameter: tabindex".to_string()))?;
    let tab_index: i64 = raw.trim().parse().map_err(|_| {
        ApiError::InvalidParameter(format!("Invalid tab index: {}. Must be an integer.", raw))
    })?;

    let closed = state.with_session(move |vv| Ok(vv.close_tab(tab_index)?)).await?;

    Ok(success(
        json!({ "test_was_closed": closed, "tab_index": tab_index }),
        format!("CloseTab command executed: tab {}", tab_index),
    ))
}

/// GET /api/listopentests
pub async fn list_open_tests(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let open_tests = state.with_session(|vv| Ok(vv.list_open_tests()?)).await?;
    let count = open_tests.len();

    Ok(success(
        json!({ "open_tests": open_tests, "count": count }),
        format!("ListOpenTests command executed: {} test(s) open", count),
    ))
}

pub fn basic_control_routes() -> Router<AppState> {
    Router::new()
        .route("/starttest", get(start_test).post(start_test))
        .route("/stoptest", get(stop_test).post(stop_test))
        .route("/resumetest", get(resume_test).post(resume_test))
        .route("/opentest", get(open_test).post(open_test).put(upload_and_open_test))
        .route("/runtest", get(run_test).post(run_test).put(upload_and_run_test))
        .route("/closetest", get(close_test).post(close_test))
        .route("/closetab", get(close_tab).post(close_tab))
        .route("/listopentests", get(list_open_tests))
}
