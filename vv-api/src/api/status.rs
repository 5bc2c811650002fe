//! Status word and test-state flags

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::response::success;
use crate::vendor::{Controller, VendorResult};
use crate::AppState;

/// Read one boolean flag and describe it
async fn flag(
    state: &AppState,
    read: fn(&dyn Controller) -> VendorResult<bool>,
    describe: fn(bool) -> String,
) -> ApiResult<Json<Value>> {
    let result = state.with_session(move |vv| Ok(read(vv)?)).await?;
    Ok(success(json!({ "result": result }), describe(result)))
}

fn yes_no(result: bool, yes: &str, no: &str) -> String {
    if result { yes } else { no }.to_string()
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let status = state.with_session(|vv| Ok(vv.status()?)).await?;
    Ok(success(
        json!({ "result": status, "color": status.color() }),
        "VibrationVIEW status retrieved successfully",
    ))
}

/// GET /api/isready
pub async fn is_ready(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.is_ready(), |r| {
        yes_no(r, "VibrationVIEW hardware is ready", "VibrationVIEW hardware is not ready")
    })
    .await
}

/// GET /api/isrunning
pub async fn is_running(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.is_running(), |r| {
        yes_no(r, "Test is running", "Test is not running")
    })
    .await
}

/// GET /api/isstarting
pub async fn is_starting(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.is_starting(), |r| {
        yes_no(r, "Test is starting", "Test is not starting")
    })
    .await
}

/// GET /api/ischanginglevel
pub async fn is_changing_level(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.is_changing_level(), |r| {
        yes_no(r, "Test level is changing", "Test level is not changing")
    })
    .await
}

/// GET /api/isholdlevel
pub async fn is_hold_level(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.is_hold_level(), |r| {
        yes_no(r, "Schedule timer is on hold", "Schedule timer is not on hold")
    })
    .await
}

/// GET /api/isopenloop
pub async fn is_open_loop(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.is_open_loop(), |r| {
        yes_no(r, "Test is running open loop", "Test is not running open loop")
    })
    .await
}

/// GET /api/isaborted
pub async fn is_aborted(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.is_aborted(), |r| {
        yes_no(r, "Test was aborted", "Test was not aborted")
    })
    .await
}

/// GET /api/canresumetest
pub async fn can_resume_test(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    flag(&state, |vv| vv.can_resume_test(), |r| {
        yes_no(r, "Test can be resumed", "Test cannot be resumed")
    })
    .await
}

/// GET /api/allstatus
///
/// A failure part way through is reported inside `connection` rather than
/// as an error response.
pub async fn all_status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let outcome = state
        .with_session(|vv| {
            Ok(json!({
                "is_ready": vv.is_ready()?,
                "is_running": vv.is_running()?,
                "is_starting": vv.is_starting()?,
                "is_changing_level": vv.is_changing_level()?,
                "is_hold_level": vv.is_hold_level()?,
                "is_open_loop": vv.is_open_loop()?,
                "is_aborted": vv.is_aborted()?,
                "can_resume_test": vv.can_resume_test()?,
                "status": vv.status()?,
            }))
        })
        .await;

    let data = match outcome {
        Ok(tests) => {
            let completed = tests.as_object().map(|o| o.len()).unwrap_or(0);
            json!({
                "connection": { "success": true, "tests_completed": completed },
                "status_tests": tests,
            })
        }
        Err(e @ ApiError::Connection(_)) => return Err(e),
        Err(e) => json!({
            "connection": { "success": false, "error": e.to_string() },
            "status_tests": {},
        }),
    };

    Ok(success(data, "Status properties diagnostic completed"))
}

pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/isready", get(is_ready))
        .route("/isrunning", get(is_running))
        .route("/isstarting", get(is_starting))
        .route("/ischanginglevel", get(is_changing_level))
        .route("/isholdlevel", get(is_hold_level))
        .route("/isopenloop", get(is_open_loop))
        .route("/isaborted", get(is_aborted))
        .route("/canresumetest", get(can_resume_test))
        .route("/allstatus", get(all_status))
}
