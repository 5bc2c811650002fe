//! Report generation through the VibrationVIEW executable
//!
//! `<exe> /savereport <data> /template <template> /output <out>` renders a
//! report from a recorded data file. Output always lands in the report
//! folder's `Temporary` subfolder.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};
use vv_common::config::ServiceConfig;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_TEMPLATE: &str = "Test Report.rtf";

const TEXT_EXTENSIONS: &[&str] = &["txt", "html", "htm", "xml", "csv"];
const BINARY_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// Runs the report executable
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    exe: PathBuf,
    output_folder: PathBuf,
}

impl ReportGenerator {
    pub fn new(exe: impl Into<PathBuf>, output_folder: impl Into<PathBuf>) -> Self {
        Self {
            exe: exe.into(),
            output_folder: output_folder.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.report_exe, config.temporary_report_folder())
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Render `data_file` with `template` into `output_name`; returns the output path.
    pub async fn generate(&self, data_file: &Path, template: &str, output_name: &str) -> ApiResult<PathBuf> {
        tokio::fs::create_dir_all(&self.output_folder).await?;
        let out_path = self.output_folder.join(output_name);

        let args = [
            "/savereport".to_string(),
            data_file.display().to_string(),
            "/template".to_string(),
            template.to_string(),
            "/output".to_string(),
            out_path.display().to_string(),
        ];
        let command_line = format!("{} {}", self.exe.display(), args.join(" "));
        debug!("Running report generator: {}", command_line);

        let output = Command::new(&self.exe)
            .args(&args)
            .output()
            .await
            .map_err(|e| ApiError::upstream(format!("Failed to generate report: {}\nCommand: {}", e, command_line)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::upstream(format!(
                "Report generation failed.\nCommand: {}\nStderr: {}",
                command_line,
                stderr.trim()
            )));
        }

        info!("Report generated: {}", out_path.display());
        Ok(out_path)
    }
}

/// Last path segment, splitting on both `/` and `\` whatever the host
fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Name and extension around the last dot; a leading dot is not an extension
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

/// Default output name: data file stem plus the template's extension (`.pdf` without one)
pub fn default_output_name(data_file: &str, template: &str) -> String {
    let (stem, _) = split_extension(basename(data_file));
    match split_extension(basename(template)) {
        (_, Some(ext)) if !ext.is_empty() => format!("{}.{}", stem, ext),
        _ => format!("{}.pdf", stem),
    }
}

/// Report file contents as returned to the client
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportContent {
    pub file_exists: bool,
    pub file_size: u64,
    pub content_type: &'static str,
    pub is_binary: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_error: Option<String>,
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Read a generated report: text formats as text, office formats as base64.
///
/// Unknown extensions are tried as UTF-8 first. Problems are reported in
/// `content_error`, never as a failure.
pub async fn read_report_content(path: &Path) -> ReportContent {
    let mut report = ReportContent {
        content_type: "unknown",
        ..Default::default()
    };

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(_) => {
            report.content_error = Some(format!("Generated file does not exist at path: {}", path.display()));
            return report;
        }
    };
    report.file_exists = true;
    report.file_size = metadata.len();

    if report.file_size == 0 {
        report.content_error = Some("Generated file is empty (0 bytes)".to_string());
        return report;
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            report.content_error = Some(format!("Failed to read file: {}", e));
            return report;
        }
    };

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        report.content_type = "text";
        report.content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => latin1(e.as_bytes()),
        };
    } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
        report.content_type = "binary";
        report.is_binary = true;
        report.content = STANDARD.encode(&bytes);
    } else {
        match String::from_utf8(bytes) {
            Ok(text) => {
                report.content_type = "text";
                report.content = text;
            }
            Err(e) => {
                report.content_type = "binary";
                report.is_binary = true;
                report.content = STANDARD.encode(e.as_bytes());
            }
        }
    }

    report
}
