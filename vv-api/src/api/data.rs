//! Live data, channel/loop metadata and raw data file download
//!
//! Channel and loop numbers are 1-based on the wire and 0-based at the
//! controller.

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::params::{body_or_query, json_object, QueryParams};
use crate::response::{finite_or_null, success};
use crate::vendor::{Controller, VendorResult};
use crate::AppState;

async fn values(
    state: &AppState,
    what: &str,
    read: fn(&dyn Controller) -> VendorResult<Vec<f64>>,
) -> ApiResult<Json<Value>> {
    let result = state.with_session(move |vv| Ok(read(vv)?)).await?;
    Ok(success(
        json!({ "result": finite_or_null(&result) }),
        format!("Retrieved {} {} values", result.len(), what),
    ))
}

/// GET /api/demand
pub async fn demand(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    values(&state, "demand", |vv| vv.demand()).await
}

/// GET /api/control
pub async fn control(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    values(&state, "control", |vv| vv.control()).await
}

/// GET /api/channel
pub async fn channel(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    values(&state, "channel", |vv| vv.channel()).await
}

/// GET /api/output
pub async fn output(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    values(&state, "output", |vv| vv.output()).await
}

async fn channel_text(
    state: &AppState,
    params: &QueryParams,
    what: &str,
    read: fn(&dyn Controller, usize) -> VendorResult<String>,
) -> ApiResult<Json<Value>> {
    let index = params.required_index("channelnum")?;
    let com = index.com;
    let result = state.with_session(move |vv| Ok(read(vv, com)?)).await?;

    Ok(success(
        json!({
            "result": result,
            "channelnum": index.user,
            "internal_channelnum": index.com,
        }),
        format!("{} retrieved for channel {}: {}", what, index.user, result),
    ))
}

async fn loop_text(
    state: &AppState,
    params: &QueryParams,
    what: &str,
    read: fn(&dyn Controller, usize) -> VendorResult<String>,
) -> ApiResult<Json<Value>> {
    let index = params.index_or("loopnum", 1)?;
    let com = index.com;
    let result = state.with_session(move |vv| Ok(read(vv, com)?)).await?;

    Ok(success(
        json!({
            "result": result,
            "loopnum": index.user,
            "internal_loopnum": index.com,
        }),
        format!("{} retrieved for loop {}: {}", what, index.user, result),
    ))
}

/// GET /api/channelunit?channelnum=<n> or /api/channelunit?<n>
pub async fn channel_unit(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    channel_text(&state, &params, "ChannelUnit", |vv, ch| vv.channel_unit(ch)).await
}

/// GET /api/channellabel?channelnum=<n> or /api/channellabel?<n>
pub async fn channel_label(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    channel_text(&state, &params, "ChannelLabel", |vv, ch| vv.channel_label(ch)).await
}

/// GET /api/controlunit[?loopnum=<n>]
pub async fn control_unit(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    loop_text(&state, &params, "ControlUnit", |vv, lp| vv.control_unit(lp)).await
}

/// GET /api/controllabel[?loopnum=<n>]
pub async fn control_label(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    loop_text(&state, &params, "ControlLabel", |vv, lp| vv.control_label(lp)).await
}

/// GET|POST /api/getdatafile
///
/// `file_path` comes from a JSON body or the query string, else the
/// controller's last data file. The path must lie inside an authorized
/// folder. The file is returned as a raw attachment.
pub async fn get_data_file(
    State(state): State<AppState>,
    params: QueryParams,
    body: Bytes,
) -> ApiResult<Response> {
    let body = json_object(&body);
    let file_path = match body_or_query(body.as_ref(), &params, "file_path") {
        Some(path) => path,
        None => {
            let last = state
                .with_session(|vv| {
                    vv.report_field("LastDataFile")
                        .map_err(|e| ApiError::vendor("Failed to get last data file from VibrationVIEW", e))
                })
                .await?;
            if last.is_empty() {
                return Err(ApiError::MissingParameter(
                    "No file_path provided and no last data file available in VibrationVIEW".to_string(),
                ));
            }
            last
        }
    };

    let validated = state
        .config
        .path_policy()
        .validate_file_path(&file_path, "data file retrieval")?;

    if !tokio::fs::try_exists(&validated).await.unwrap_or(false) {
        return Err(ApiError::NotFound(format!("File not found: {}", validated.display())));
    }

    let contents = tokio::fs::read(&validated)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to retrieve data file: {}", e)))?;
    let file_name = validated
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "data.vrd".to_string());
    info!("Serving data file {} ({} bytes)", validated.display(), contents.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
            ),
        ],
        contents,
    )
        .into_response())
}

pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/demand", get(demand))
        .route("/control", get(control))
        .route("/channel", get(channel))
        .route("/output", get(output))
        .route("/channelunit", get(channel_unit))
        .route("/channellabel", get(channel_label))
        .route("/controlunit", get(control_unit))
        .route("/controllabel", get(control_label))
        .route("/getdatafile", get(get_data_file).post(get_data_file))
}
