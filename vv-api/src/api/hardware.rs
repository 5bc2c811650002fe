//! Hardware identification and per-channel capability checks

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::params::QueryParams;
use crate::response::success;
use crate::vendor::InputSetting;
use crate::AppState;

/// GET /api/gethardwareinputchannels
pub async fn hardware_input_channels(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.hardware_input_channels()?)).await?;
    Ok(success(json!({ "result": result }), format!("Hardware input channels: {}", result)))
}

/// GET /api/gethardwareoutputchannels
pub async fn hardware_output_channels(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.hardware_output_channels()?)).await?;
    Ok(success(json!({ "result": result }), format!("Hardware output channels: {}", result)))
}

/// GET /api/gethardwareserialnumber
pub async fn hardware_serial_number(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.hardware_serial_number()?)).await?;
    Ok(success(json!({ "result": result }), format!("Hardware serial number: {}", result)))
}

/// GET /api/getsoftwareversion
pub async fn software_version(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.software_version()?)).await?;
    Ok(success(json!({ "result": result }), format!("Software version: {}", result)))
}

async fn supports(state: &AppState, params: &QueryParams, capability: InputSetting) -> ApiResult<Json<Value>> {
    let index = params.required_index("channel")?;
    let com = index.com;
    let result = state
        .with_session(move |vv| Ok(vv.hardware_supports(capability, com)?))
        .await?;

    Ok(success(
        json!({ "result": result, "channel": index.user, "internal_channel": index.com }),
        format!("Channel {} {} support: {}", index.user, capability.describe(), result),
    ))
}

/// GET /api/hardwaresupportscapacitorcoupled?<channel>
pub async fn supports_capacitor_coupled(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    supports(&state, &params, InputSetting::CapacitorCoupled).await
}

/// GET /api/hardwaresupportsaccelpowersource?<channel>
pub async fn supports_accel_power_source(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    supports(&state, &params, InputSetting::AccelPowerSource).await
}

/// GET /api/hardwaresupportsdifferential?<channel>
pub async fn supports_differential(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    supports(&state, &params, InputSetting::Differential).await
}

pub fn hardware_routes() -> Router<AppState> {
    Router::new()
        .route("/gethardwareinputchannels", get(hardware_input_channels))
        .route("/gethardwareoutputchannels", get(hardware_output_channels))
        .route("/gethardwareserialnumber", get(hardware_serial_number))
        .route("/getsoftwareversion", get(software_version))
        .route("/hardwaresupportscapacitorcoupled", get(supports_capacitor_coupled))
        .route("/hardwaresupportsaccelpowersource", get(supports_accel_power_source))
        .route("/hardwaresupportsdifferential", get(supports_differential))
}
