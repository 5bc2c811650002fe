//! Success envelope shared by every handler

use axum::Json;
use chrono::Local;
use serde_json::{json, Value};

/// Local ISO 8601 timestamp stamped on every envelope
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// `{success: true, message, timestamp, data}`
pub fn success(data: Value, message: impl Into<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message.into(),
        "timestamp": timestamp(),
        "data": data,
    }))
}

/// Replace non-finite floats with `null` so the payload stays valid JSON
pub fn finite_or_null(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| if v.is_finite() { Some(*v) } else { None })
        .collect()
}
