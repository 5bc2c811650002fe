//! Shared setup for vv-api integration tests
//!
//! Each test gets its own router over a [`SimulatedConnector`] and a
//! temporary VibrationVIEW folder tree (`Profiles/`, `Reports/`).

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use vv_api::vendor::{SimState, SimulatedConnector};
use vv_api::{build_router, AppState};
use vv_common::config::ServiceConfig;

pub struct TestApp {
    pub router: Router,
    pub connector: SimulatedConnector,
    pub config: ServiceConfig,
    pub dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_state(SimState::default())
    }

    pub fn with_state(sim: SimState) -> Self {
        Self::with_report_exe(sim, "true")
    }

    /// `report_exe` is run in place of VibrationVIEW for report generation
    pub fn with_report_exe(sim: SimState, report_exe: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            profile_folder: dir.path().join("Profiles"),
            report_folder: dir.path().join("Reports"),
            report_exe: PathBuf::from(report_exe),
            ..Default::default()
        };
        std::fs::create_dir_all(&config.profile_folder).unwrap();
        std::fs::create_dir_all(&config.report_folder).unwrap();

        let connector = SimulatedConnector::new(sim);
        let state = AppState::new(config.clone(), Arc::new(connector.clone()));

        Self {
            router: build_router(state),
            connector,
            config,
            dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(test_request("GET", uri)).await
    }

    /// Write `contents` under the report folder and return its path
    pub fn report_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.config.report_folder.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

pub fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Raw binary body with an explicit Content-Length
pub fn binary_request(method: &str, uri: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes.to_vec()))
        .unwrap()
}

/// Single-file multipart body and its Content-Type
pub fn multipart_body(filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "vv-api-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}

pub fn multipart_request(method: &str, uri: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let (content_type, body) = multipart_body(filename, bytes);

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

pub async fn extract_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub async fn extract_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}
