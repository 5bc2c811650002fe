//! Rear (auxiliary) inputs

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::params::QueryParams;
use crate::response::{finite_or_null, success};
use crate::AppState;

/// GET /api/rearinput: one value per rear input
pub async fn rear_input(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let values = state.with_session(|vv| Ok(vv.rear_input()?)).await?;

    Ok(success(
        json!({ "result": finite_or_null(&values) }),
        format!("Retrieved {} rear input values", values.len()),
    ))
}

/// GET /api/rearinputunit?channel=<n> or ?<n> (1-based)
pub async fn rear_input_unit(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let index = params.required_index("channel")?;
    let com = index.com;
    let result = state.with_session(move |vv| Ok(vv.rear_input_unit(com)?)).await?;

    Ok(success(
        json!({ "result": result, "channel": index.user, "internal_channel": index.com }),
        format!("Rear input {} unit: {}", index.user, result),
    ))
}

/// GET /api/rearinputlabel?channel=<n> or ?<n> (1-based)
pub async fn rear_input_label(State(state): State<AppState>, params: QueryParams) -> ApiResult<Json<Value>> {
    let index = params.required_index("channel")?;
    let com = index.com;
    let result = state.with_session(move |vv| Ok(vv.rear_input_label(com)?)).await?;

    Ok(success(
        json!({ "result": result, "channel": index.user, "internal_channel": index.com }),
        format!("Rear input {} label: {}", index.user, result),
    ))
}

pub fn aux_input_routes() -> Router<AppState> {
    Router::new()
        .route("/rearinput", get(rear_input))
        .route("/rearinputunit", get(rear_input_unit))
        .route("/rearinputlabel", get(rear_input_label))
}
