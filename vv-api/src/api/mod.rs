//! HTTP API handlers for vv-api

pub mod aux_inputs;
pub mod basic_control;
pub mod data;
pub mod docs;
pub mod gui;
pub mod hardware;
pub mod health;
pub mod input_config;
pub mod recording;
pub mod report_generation;
pub mod reporting;
pub mod status;
pub mod teds;
pub mod vectors;
pub mod virtual_channels;

pub use aux_inputs::aux_input_routes;
pub use basic_control::basic_control_routes;
pub use data::data_routes;
pub use docs::docs_routes;
pub use gui::gui_routes;
pub use hardware::hardware_routes;
pub use health::health_routes;
pub use input_config::input_config_routes;
pub use recording::recording_routes;
pub use report_generation::report_generation_routes;
pub use reporting::reporting_routes;
pub use status::status_routes;
pub use teds::teds_routes;
pub use vectors::vector_routes;
pub use virtual_channels::virtual_channel_routes;

use axum::http::Uri;

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Endpoint not found: {}", uri.path()))
}
