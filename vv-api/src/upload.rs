//! Test profile uploads
//!
//! A request carries at most one file, either as the first multipart field
//! with a filename or as a raw binary body named by the query string.
//! Uploads are capped at [`MAX_UPLOAD_SIZE`] and restricted to the
//! VibrationVIEW profile extensions before anything touches the disk.

use std::path::{Path, PathBuf};

use axum::{
    async_trait,
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Query, Request},
    http::{header, HeaderMap, StatusCode},
};
use serde::Serialize;
use tracing::{debug, info};
use vv_common::config::ServiceConfig;
use vv_common::paths::secure_path_join;

use crate::error::{ApiError, ApiResult};
use crate::params::QueryParams;

/// Upload ceiling (10 MiB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Slack for multipart boundaries and headers on top of the file itself
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "vrp", "vrpj", "vasor", "vkp", "vkpj", "vkd", "vsp", "vspj", "vsd", "vdp", "vdpj", "vdd",
    "vsyscheckt", "vsinet", "vrandomt", "vsort", "vrort", "vsorort", "vsost", "vanalyzert",
    "vshockt", "vudtt", "vsrst", "vtransientt", "vic", "vchan",
];

/// Test templates, stored in the new-test-defaults folder when configured
pub const TEMPLATE_EXTENSIONS: &[&str] = &[
    "vsyscheckt", "vsinet", "vrandomt", "vsort", "vrort", "vsorort", "vsost", "vanalyzert",
    "vshockt", "vudtt", "vsrst", "vtransientt",
];

/// Stock template names: copied into place but never opened
pub const DEFAULT_TEMPLATE_FILENAMES: &[&str] = &[
    "random.vrandomt",
    "sine.vsinet",
    "shock.vshockt",
    "fdr.vfdrt",
    "sor.vsort",
    "sos.vsost",
    "ror.vrort",
    "sororor.vsorort",
    "srs.vsrst",
    "user-defined transient.vudtt",
    "transient.vtransientt",
    "analyzer.vanalyzert",
];

const TOO_LARGE: &str = "File too large (max 10MB)";

/// Lowercased extension after the last dot
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn is_template_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_default_template_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    DEFAULT_TEMPLATE_FILENAMES.contains(&lower.as_str())
}

/// Reduce a client-supplied name to a safe single path segment
pub fn sanitize_filename(filename: &str) -> String {
    let flattened = filename.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim_start_matches(['.', '_'])
        .to_string()
}

/// How the request body should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Multipart,
    Binary,
    Empty,
}

/// Decide the body mode from the request headers alone
pub fn classify(content_type: Option<&str>, content_length: Option<u64>) -> BodyKind {
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    if content_type.contains("multipart") {
        return BodyKind::Multipart;
    }
    let has_body = content_length.is_some_and(|len| len > 0);
    if has_body
        && !content_type.contains("application/json")
        && !content_type.contains("application/x-www-form-urlencoded")
    {
        BodyKind::Binary
    } else {
        BodyKind::Empty
    }
}

/// Declared `Content-Length`, if present and numeric
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// 413 when the declared length is over the ceiling, whatever the body mode
pub fn reject_oversize(headers: &HeaderMap) -> ApiResult<()> {
    match declared_length(headers) {
        Some(len) if len > MAX_UPLOAD_SIZE as u64 => Err(ApiError::FileTooLarge(TOO_LARGE.to_string())),
        _ => Ok(()),
    }
}

/// Read a raw binary body: Content-Length is required and bounded.
pub async fn read_raw_body(request: Request) -> ApiResult<Bytes> {
    let length = declared_length(request.headers())
        .ok_or_else(|| ApiError::LengthRequired("Missing Content-Length header".to_string()))?;
    if length > MAX_UPLOAD_SIZE as u64 {
        return Err(ApiError::FileTooLarge(TOO_LARGE.to_string()));
    }
    axum::body::to_bytes(request.into_body(), MAX_UPLOAD_SIZE)
        .await
        .map_err(|_| ApiError::FileTooLarge(TOO_LARGE.to_string()))
}

/// File pulled out of a request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Optional upload detected on a POST/PUT request
#[derive(Debug)]
pub struct DetectedUpload(pub Option<UploadedFile>);

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::FileTooLarge(TOO_LARGE.to_string())
    } else {
        ApiError::InvalidFile(format!("Malformed multipart body: {}", err.body_text()))
    }
}

#[async_trait]
impl<S> FromRequest<S> for DetectedUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        reject_oversize(req.headers())?;

        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = declared_length(req.headers());
        let kind = classify(content_type.as_deref(), content_length);
        debug!(?kind, ?content_type, ?content_length, "Classified request body");

        match kind {
            BodyKind::Multipart => {
                let mut multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::InvalidFile(format!("Invalid multipart request: {}", e)))?;

                while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
                    let Some(filename) = field.file_name().map(str::to_string) else {
                        continue;
                    };
                    if filename.is_empty() {
                        return Err(ApiError::InvalidFile(
                            "Multipart file field has no filename".to_string(),
                        ));
                    }
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if bytes.len() > MAX_UPLOAD_SIZE {
                        return Err(ApiError::FileTooLarge(TOO_LARGE.to_string()));
                    }
                    debug!(filename = %filename, size = bytes.len(), "Multipart upload detected");
                    return Ok(Self(Some(UploadedFile { filename, bytes })));
                }
                Ok(Self(None))
            }
            BodyKind::Binary => {
                let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
                    .map_err(|e| ApiError::InvalidParameter(format!("Invalid query string: {}", e)))?;
                let filename = QueryParams(pairs).named_or_whole("filename").ok_or_else(|| {
                    ApiError::InvalidFile(
                        "Missing filename: provide via multipart/form-data file field or query parameter"
                            .to_string(),
                    )
                })?;
                let bytes = read_raw_body(req).await?;
                debug!(filename = %filename, size = bytes.len(), "Raw binary upload detected");
                Ok(Self(Some(UploadedFile { filename, bytes })))
            }
            BodyKind::Empty => Ok(Self(None)),
        }
    }
}

/// Raw binary body named by the query string (`filename=` or unnamed).
///
/// Checks run in order: size ceiling, filename, Content-Length.
#[derive(Debug)]
pub struct RawUpload(pub UploadedFile);

#[async_trait]
impl<S> FromRequest<S> for RawUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        reject_oversize(req.headers())?;

        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
            .map_err(|e| ApiError::InvalidParameter(format!("Invalid query string: {}", e)))?;
        let filename = QueryParams(pairs).named_or_whole("filename").ok_or_else(|| {
            ApiError::MissingParameter(
                "Missing required query parameter: filename (or unnamed filename parameter)".to_string(),
            )
        })?;

        let bytes = read_raw_body(req).await?;
        debug!(filename = %filename, size = bytes.len(), "Raw upload received");
        Ok(Self(UploadedFile { filename, bytes }))
    }
}

/// Where a saved upload ended up
#[derive(Debug, Clone, Serialize)]
pub struct SavedUpload {
    pub file_path: PathBuf,
    pub filename: String,
    pub size: u64,
}

/// Validate and write an upload.
///
/// `folder` defaults to the configured upload folder. With `unique` a
/// UUID is appended to the file stem.
pub async fn save_upload(
    config: &ServiceConfig,
    filename: &str,
    bytes: &[u8],
    folder: Option<&Path>,
    unique: bool,
) -> ApiResult<SavedUpload> {
    let ext = extension_of(filename)
        .filter(|_| !filename.is_empty())
        .ok_or_else(|| ApiError::InvalidFile("Missing or invalid filename".to_string()))?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ApiError::InvalidFile(format!("Invalid file extension: .{}", ext)));
    }

    let folder = match folder {
        Some(folder) => folder.to_path_buf(),
        None => config.upload_folder(),
    };
    tokio::fs::create_dir_all(&folder).await?;

    let filename = if unique {
        let (stem, ext) = filename.rsplit_once('.').unwrap_or((filename, ""));
        format!("{}_{}.{}", stem, uuid::Uuid::new_v4().simple(), ext)
    } else {
        filename.to_string()
    };

    let safe_name = sanitize_filename(&filename);
    if safe_name.is_empty() || extension_of(&safe_name).is_none() {
        return Err(ApiError::InvalidFile("Missing or invalid filename".to_string()));
    }

    let file_path = secure_path_join(&folder, &[safe_name.as_str()])?;
    tokio::fs::write(&file_path, bytes).await?;
    info!("Binary file saved: {}", file_path.display());

    Ok(SavedUpload {
        file_path,
        filename,
        size: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn classification_by_headers() {
        assert_eq!(classify(Some("multipart/form-data; boundary=x"), Some(100)), BodyKind::Multipart);
        assert_eq!(classify(Some("application/octet-stream"), Some(100)), BodyKind::Binary);
        assert_eq!(classify(None, Some(100)), BodyKind::Binary);
        assert_eq!(classify(Some("application/json"), Some(100)), BodyKind::Empty);
        assert_eq!(classify(Some("application/x-www-form-urlencoded"), Some(10)), BodyKind::Empty);
        assert_eq!(classify(Some("application/octet-stream"), Some(0)), BodyKind::Empty);
        assert_eq!(classify(None, None), BodyKind::Empty);
    }

    #[test]
    fn oversize_declared_length_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, (MAX_UPLOAD_SIZE + 1).to_string().parse().unwrap());
        assert_eq!(reject_oversize(&headers).unwrap_err().code(), "FILE_TOO_LARGE");

        headers.insert(header::CONTENT_LENGTH, MAX_UPLOAD_SIZE.to_string().parse().unwrap());
        assert!(reject_oversize(&headers).is_ok());
    }

    #[test]
    fn template_detection() {
        assert!(is_template_file("Custom.VSINET"));
        assert!(!is_template_file("profile.vsp"));
        assert!(!is_template_file("noext"));
        assert!(is_default_template_filename("Sine.vsinet"));
        assert!(is_default_template_filename("User-Defined Transient.vudtt"));
        assert!(!is_default_template_filename("my sine.vsinet"));
    }

    #[test]
    fn filenames_are_flattened() {
        assert_eq!(sanitize_filename("../../etc/passwd.vsp"), "etc_passwd.vsp");
        assert_eq!(sanitize_filename("My Test (v2).vsp"), "My_Test_v2.vsp");
        assert_eq!(sanitize_filename("C:\\Profiles\\sine.vsp"), "C_Profiles_sine.vsp");
    }

    #[tokio::test]
    async fn saves_allowed_upload() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            profile_folder: dir.path().to_path_buf(),
            ..Default::default()
        };

        let saved = save_upload(&config, "sine.vsp", b"profile", None, false).await.unwrap();
        assert_eq!(saved.file_path, dir.path().join("Uploads").join("sine.vsp"));
        assert_eq!(saved.size, 7);
        assert_eq!(std::fs::read(&saved.file_path).unwrap(), b"profile");
    }

    #[tokio::test]
    async fn unique_names_get_a_suffix() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            profile_folder: dir.path().to_path_buf(),
            ..Default::default()
        };

        let saved = save_upload(&config, "sine.vsp", b"x", None, true).await.unwrap();
        assert!(saved.filename.starts_with("sine_"));
        assert!(saved.filename.ends_with(".vsp"));
        assert_ne!(saved.filename, "sine.vsp");
    }

    #[tokio::test]
    async fn rejects_disallowed_extension() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            profile_folder: dir.path().to_path_buf(),
            ..Default::default()
        };

        let err = save_upload(&config, "payload.exe", b"x", None, false).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_FILE");
        assert!(err.to_string().contains(".exe"));

        let err = save_upload(&config, "noextension", b"x", None, false).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_FILE");
    }
}
