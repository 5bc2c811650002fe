//! Health check endpoint
//!
//! Reports service uptime and whether VibrationVIEW can be reached. A
//! controller that cannot be reached makes the service `degraded`, not
//! unhealthy; the HTTP status stays 200.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::AppState;

/// Controller details gathered for the health report
#[derive(Debug, Serialize)]
pub struct VibrationViewStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_channels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_channels: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    /// Module name ("vv-api")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Configured API version
    pub api_version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub vibrationview: VibrationViewStatus,
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let vibrationview = match state
        .with_session(|vv| {
            Ok(VibrationViewStatus {
                connected: true,
                software_version: Some(vv.software_version()?),
                input_channels: Some(vv.hardware_input_channels()?),
                output_channels: Some(vv.hardware_output_channels()?),
                error: None,
            })
        })
        .await
    {
        Ok(status) => status,
        Err(e) => {
            debug!("Health check could not reach VibrationVIEW: {}", e);
            VibrationViewStatus {
                connected: false,
                software_version: None,
                input_channels: None,
                output_channels: None,
                error: Some(e.to_string()),
            }
        }
    };

    Json(HealthResponse {
        status: if vibrationview.connected { "ok" } else { "degraded" }.to_string(),
        module: "vv-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: state.config.api_version.clone(),
        uptime_seconds,
        vibrationview,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
