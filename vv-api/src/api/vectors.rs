//! Legacy raw data vectors and their properties

use axum::{body::Bytes, extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::params::{json_object, QueryParams};
use crate::response::{finite_or_null, success};
use crate::AppState;

fn missing_vectorenum() -> ApiError {
    ApiError::MissingParameter("Missing required parameter: vectorenum".to_string())
}

async fn read_vector(state: &AppState, vectorenum: Option<i64>, columns: i64) -> ApiResult<Json<Value>> {
    let vectorenum = vectorenum.ok_or_else(missing_vectorenum)?;
    if columns < 1 {
        return Err(ApiError::InvalidParameter(format!("columns must be >= 1, got {}", columns)));
    }

    let data = state
        .with_session(move |vv| {
            vv.vector(vectorenum, columns as usize)
                .map_err(|e| ApiError::vendor("Failed to retrieve vector data", e))
        })
        .await?;
    let rows = data.len();
    let result: Vec<_> = data.iter().map(|row| finite_or_null(row)).collect();

    Ok(success(
        json!({
            "result": result,
            "vectorenum": vectorenum,
            "columns": columns,
            "rows": rows,
        }),
        format!(
            "Retrieved vector data for vectorenum {} with {} columns",
            vectorenum, columns
        ),
    ))
}

/// GET /api/vector?vectorenum=<n>[&columns=<c>] or /api/vector?<n>[&columns=<c>]
pub async fn vector(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let vectorenum = params
        .get("vectorenum")
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| params.first_key().and_then(|k| k.trim().parse().ok()));
    let columns = params
        .get("columns")
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(1);

    read_vector(&state, vectorenum, columns).await
}

/// POST /api/vector with `{"vectorenum": n, "columns": c}`
pub async fn vector_from_body(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body = json_object(&body);
    let vectorenum = body.as_ref().and_then(|b| b.get("vectorenum")).and_then(Value::as_i64);
    let columns = match body.as_ref().and_then(|b| b.get("columns")) {
        None | Some(Value::Null) => 1,
        Some(value) => value
            .as_i64()
            .ok_or_else(|| ApiError::InvalidParameter("columns must be an integer".to_string()))?,
    };

    read_vector(&state, vectorenum, columns).await
}

/// GET /api/vectorunit?<n>
pub async fn vector_unit(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let vectorenum = params.required_integer("vectorenum")?;
    let result = state.with_session(move |vv| Ok(vv.vector_unit(vectorenum)?)).await?;
    Ok(success(
        json!({ "result": result, "vectorenum": vectorenum }),
        format!("VectorUnit retrieved for vectorenum {}: {}", vectorenum, result),
    ))
}

/// GET /api/vectorlabel?<n>
pub async fn vector_label(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let vectorenum = params.required_integer("vectorenum")?;
    let result = state.with_session(move |vv| Ok(vv.vector_label(vectorenum)?)).await?;
    Ok(success(
        json!({ "result": result, "vectorenum": vectorenum }),
        format!("VectorLabel retrieved for vectorenum {}: {}", vectorenum, result),
    ))
}

/// GET /api/vectorlength?<n>
pub async fn vector_length(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let vectorenum = params.required_integer("vectorenum")?;
    let result = state.with_session(move |vv| Ok(vv.vector_length(vectorenum)?)).await?;
    Ok(success(
        json!({ "result": result, "vectorenum": vectorenum }),
        format!("VectorLength retrieved for vectorenum {}: {}", vectorenum, result),
    ))
}

pub fn vector_routes() -> Router<AppState> {
    Router::new()
        .route("/vector", get(vector).post(vector_from_body))
        .route("/vectorunit", get(vector_unit))
        .route("/vectorlabel", get(vector_label))
        .route("/vectorlength", get(vector_length))
}
