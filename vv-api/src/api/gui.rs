//! Editor control: edit a test (optionally uploading it first) and abort an edit

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::params::QueryParams;
use crate::response::success;
use crate::upload::{save_upload, DetectedUpload};
use crate::AppState;

async fn edit_by_name(state: &AppState, params: &QueryParams) -> ApiResult<Json<Value>> {
    let filename = params
        .named_or_whole("filename")
        .ok_or_else(|| ApiError::MissingParameter("Missing required query parameter: filename".to_string()))?;

    let name = filename.clone();
    let result = state
        .with_session(move |vv| {
            vv.edit_test(&name)
                .map_err(|e| ApiError::vendor(format!("Failed to edit test \"{}\"", name), e))
        })
        .await?;

    Ok(success(
        json!({ "result": result, "filepath": filename }),
        format!("EditTest command executed: {}", filename),
    ))
}

/// GET /api/edittest?filename=<path> or /api/edittest?<path>
pub async fn edit_test(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    edit_by_name(&state, &params).await
}

/// POST|PUT /api/edittest
///
/// A multipart file or raw body is saved to the upload folder and opened in
/// the editor. Without a body this behaves like the GET form.
pub async fn upload_and_edit_test(
    State(state): State<AppState>,
    params: QueryParams,
    DetectedUpload(upload): DetectedUpload,
) -> ApiResult<Json<Value>> {
    let Some(upload) = upload else {
        return edit_by_name(&state, &params).await;
    };

    let filename = upload.filename;
    let saved = save_upload(&state.config, &filename, &upload.bytes, None, false).await?;

    let path = saved.file_path.display().to_string();
    let name = filename.clone();
    state
        .with_session(move |vv| {
            vv.edit_test(&path).map_err(|e| {
                ApiError::vendor(format!("File uploaded but failed to edit test \"{}\"", name), e)
            })
        })
        .await?;

    Ok(success(
        json!({ "result": true, "filepath": filename, "file_uploaded": true }),
        format!("Upload and EditTest command executed: {}", filename),
    ))
}

/// GET /api/abortedit
pub async fn abort_edit(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let result = state.with_session(|vv| Ok(vv.abort_edit()?)).await?;

    Ok(success(
        json!({ "result": result, "executed": true }),
        format!("AbortEdit command executed - Result: {}", result),
    ))
}

pub fn gui_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/edittest",
            get(edit_test).post(upload_and_edit_test).put(upload_and_edit_test),
        )
        .route("/abortedit", get(abort_edit))
}
