//! vv-api library - VibrationVIEW REST automation service
//!
//! Exposes the VibrationVIEW automation interface over HTTP. Every request
//! that touches the controller opens its own session through the
//! configured [`vendor::Connector`].

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use chrono::{DateTime, Utc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use vv_common::config::ServiceConfig;

pub mod api;
pub mod error;
pub mod params;
pub mod report;
pub mod response;
pub mod upload;
pub mod vendor;

use error::{ApiError, ApiResult};
use vendor::{Connector, Controller, Session};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved service configuration (read-only)
    pub config: Arc<ServiceConfig>,
    /// Opens VibrationVIEW sessions
    pub connector: Arc<dyn Connector>,
    /// Service start time, for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            startup_time: Utc::now(),
        }
    }

    /// Run `f` against a fresh VibrationVIEW session on a blocking thread.
    ///
    /// The session is released when `f` returns, whether it succeeded or not.
    pub async fn with_session<T, F>(&self, f: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Controller) -> ApiResult<T> + Send + 'static,
    {
        let connector = Arc::clone(&self.connector);
        tokio::task::spawn_blocking(move || {
            let session = Session::open(connector.as_ref()).map_err(|e| {
                ApiError::Connection(format!("Cannot connect to VibrationVIEW: {}", e.message))
            })?;
            f(&*session)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("VibrationVIEW task failed: {}", e)))?
    }
}

fn cors_layer(origins: &str) -> CorsLayer {
    let origins = origins.trim();
    if origins.is_empty() || origins == "*" {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api = Router::new()
        .merge(api::health_routes())
        .merge(api::docs_routes())
        .merge(api::basic_control_routes())
        .merge(api::gui_routes())
        .merge(api::status_routes())
        .merge(api::data_routes())
        .merge(api::vector_routes())
        .merge(api::hardware_routes())
        .merge(api::aux_input_routes())
        .merge(api::input_config_routes())
        .merge(api::recording_routes())
        .merge(api::virtual_channel_routes())
        .merge(api::teds_routes())
        .merge(api::reporting_routes())
        .merge(api::report_generation_routes());

    Router::new()
        .nest("/api", api)
        .fallback(api::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_SIZE + upload::MULTIPART_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
