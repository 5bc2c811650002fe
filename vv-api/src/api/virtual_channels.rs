//! Virtual channel import and removal

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::params::QueryParams;
use crate::response::success;
use crate::upload::{save_upload, DetectedUpload};
use crate::AppState;

/// GET|POST /api/removeallvirtualchannels
pub async fn remove_all_virtual_channels(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.remove_all_virtual_channels()?)).await?;
    Ok(success(json!({ "result": result }), "RemoveAllVirtualChannels command executed"))
}

async fn import_by_name(state: &AppState, params: &QueryParams) -> ApiResult<Json<Value>> {
    let filename = params.named_or_whole("filename").ok_or_else(|| {
        ApiError::MissingParameter(
            "Missing required query parameter: filename (or unnamed filename parameter)".to_string(),
        )
    })?;

    let path = filename.clone();
    let result = state
        .with_session(move |vv| Ok(vv.import_virtual_channels(&path)?))
        .await?;

    Ok(success(
        json!({ "result": result, "filepath": filename }),
        format!("ImportVirtualChannels command executed: {}", filename),
    ))
}

/// GET /api/importvirtualchannels?filename=<path> or ?<path>
pub async fn import_virtual_channels(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    import_by_name(&state, &params).await
}

/// POST|PUT /api/importvirtualchannels
///
/// Multipart or raw uploads are saved and imported; a request without a
/// file imports by name like the GET form.
pub async fn upload_and_import_virtual_channels(
    State(state): State<AppState>,
    params: QueryParams,
    DetectedUpload(upload): DetectedUpload,
) -> ApiResult<Json<Value>> {
    let Some(upload) = upload else {
        return import_by_name(&state, &params).await;
    };

    let filename = upload.filename;
    let saved = save_upload(&state.config, &filename, &upload.bytes, None, false).await?;

    let path = saved.file_path.display().to_string();
    let name = filename.clone();
    let result = state
        .with_session(move |vv| {
            vv.import_virtual_channels(&path).map_err(|e| {
                ApiError::vendor(
                    format!("File uploaded but failed to import virtual channels \"{}\"", name),
                    e,
                )
            })
        })
        .await?;

    Ok(success(
        json!({ "result": result, "filepath": filename, "file_uploaded": true }),
        format!("Virtual channels file '{}' uploaded and imported successfully", filename),
    ))
}

pub fn virtual_channel_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/removeallvirtualchannels",
            get(remove_all_virtual_channels).post(remove_all_virtual_channels),
        )
        .route(
            "/importvirtualchannels",
            get(import_virtual_channels)
                .post(upload_and_import_virtual_channels)
                .put(upload_and_import_virtual_channels),
        )
}
