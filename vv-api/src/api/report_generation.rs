//! Report generation from recorded data files

use std::path::Path;

use axum::{
    body::Bytes,
    extract::{Request, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::params::{body_or_query, json_object, QueryParams};
use crate::report::{default_output_name, read_report_content, ReportGenerator, DEFAULT_TEMPLATE};
use crate::response::success;
use crate::upload::{read_raw_body, reject_oversize};
use crate::AppState;

/// Bare file name of a validated output path
fn output_file_name(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// POST /api/generatereport
///
/// `file_path`, `template_name` and `output_name` come from a JSON body or
/// the query string. Without a data file the controller's last data file
/// is used; the output name defaults to the data file stem with the
/// template's extension.
pub async fn generate_report(
    State(state): State<AppState>,
    params: QueryParams,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = json_object(&body);
    let requested_path = body_or_query(body.as_ref(), &params, "file_path");
    let used_last_data_file = requested_path.is_none();

    let file_path = match requested_path {
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

    let template_name =
        body_or_query(body.as_ref(), &params, "template_name").unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
    let output_name = body_or_query(body.as_ref(), &params, "output_name")
        .unwrap_or_else(|| default_output_name(&file_path, &template_name));

    let policy = state.config.path_policy();
    let data_file = policy.validate_file_path(&file_path, "report generation")?;
    if !tokio::fs::try_exists(&data_file).await.unwrap_or(false) {
        return Err(ApiError::NotFound(format!("File not found: {}", data_file.display())));
    }
    let output_path = policy.validate_output_path(&output_name, "report generation")?;
    let output_name = output_file_name(&output_path, &output_name);

    let generator = ReportGenerator::from_config(&state.config);
    let generated = generator.generate(&data_file, &template_name, &output_name).await?;
    let content = read_report_content(&generated).await;

    let mut message = format!("Report generated: {}", generated.display());
    if let Some(warning) = &content.content_error {
        message.push_str(&format!(" (Warning: {})", warning));
    }

    let mut data = json!({
        "generated_file_path": generated.display().to_string(),
        "file_path": data_file.display().to_string(),
        "template_name": template_name,
        "output_name": output_name,
        "used_last_data_file": used_last_data_file,
    });
    let content = serde_json::to_value(&content)
        .map_err(|e| ApiError::Internal(format!("Failed to encode report content: {}", e)))?;
    if let (Value::Object(data), Value::Object(content)) = (&mut data, content) {
        data.extend(content);
    }

    Ok(success(data, message))
}

/// PUT /api/generatereport?template_name=<t>&output_name=<o>
///
/// The body is a raw `.vrd` data file. It is written to a temporary file
/// in the report folder and removed once the report has been rendered.
pub async fn upload_and_generate_report(
    State(state): State<AppState>,
    params: QueryParams,
    request: Request,
) -> ApiResult<Json<Value>> {
    reject_oversize(request.headers())?;

    let template_name = params
        .get("template_name")
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::MissingParameter("Missing required query parameter: template_name".to_string()))?;
    let output_name = params
        .get("output_name")
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::MissingParameter("Missing required query parameter: output_name".to_string()))?;

    let output_path = state
        .config
        .path_policy()
        .validate_output_path(&output_name, "report generation (upload)")?;
    let output_name = output_file_name(&output_path, &output_name);

    let bytes = read_raw_body(request).await?;
    let uploaded_size = bytes.len();

    let generator = ReportGenerator::from_config(&state.config);
    tokio::fs::create_dir_all(generator.output_folder()).await?;
    let temp_path = generator
        .output_folder()
        .join(format!("upload_{}.vrd", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&temp_path, &bytes).await?;
    info!("Uploaded data file staged at {} ({} bytes)", temp_path.display(), uploaded_size);

    let outcome = generator.generate(&temp_path, &template_name, &output_name).await;

    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        warn!("Failed to clean up temporary file {}: {}", temp_path.display(), e);
    }

    let generated = outcome?;
    let (file_exists, file_size) = match tokio::fs::metadata(&generated).await {
        Ok(metadata) => (true, metadata.len()),
        Err(_) => (false, 0),
    };

    Ok(success(
        json!({
            "generated_file_path": generated.display().to_string(),
            "template_name": template_name,
            "output_name": output_name,
            "uploaded_file_size": uploaded_size,
            "file_exists": file_exists,
            "file_size": file_size,
        }),
        format!("Report generated successfully from uploaded file: {}", generated.display()),
    ))
}

pub fn report_generation_routes() -> Router<AppState> {
    Router::new().route(
        "/generatereport",
        post(generate_report).put(upload_and_generate_report),
    )
}
