//! Data recording control

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::response::success;
use crate::AppState;

/// GET|POST /api/recordstart
pub async fn record_start(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.record_start()?)).await?;
    Ok(success(json!({ "result": result }), "RecordStart command executed"))
}

/// GET|POST /api/recordstop
pub async fn record_stop(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.record_stop()?)).await?;
    Ok(success(json!({ "result": result }), "RecordStop command executed"))
}

/// GET|POST /api/recordpause
pub async fn record_pause(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.record_pause()?)).await?;
    Ok(success(json!({ "result": result }), "RecordPause command executed"))
}

/// GET /api/recordgetfilename: file of the last recording
pub async fn record_get_filename(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.record_filename()?)).await?;
    Ok(success(
        json!({ "result": result, "executed": true }),
        format!("RecordGetFilename executed successfully: {}", result),
    ))
}

pub fn recording_routes() -> Router<AppState> {
    Router::new()
        .route("/recordstart", get(record_start).post(record_start))
        .route("/recordstop", get(record_stop).post(record_stop))
        .route("/recordpause", get(record_pause).post(record_pause))
        .route("/recordgetfilename", get(record_get_filename))
}
