//! Service configuration resolution
//!
//! Every field is resolved independently, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::paths::PathPolicy;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_PROFILE_FOLDER: &str = "C:\\VibrationVIEW\\Profiles";
pub const DEFAULT_REPORT_FOLDER: &str = "C:\\VibrationVIEW\\Reports";
pub const DEFAULT_REPORT_EXE: &str = "C:\\Program Files\\VibrationVIEW 2025\\VibrationVIEW.exe";
pub const DEFAULT_API_VERSION: &str = "1.0.0";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_CORS_ORIGINS: &str = "*";

/// Resolved, read-only service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub profile_folder: PathBuf,
    pub report_folder: PathBuf,
    pub data_folder: Option<PathBuf>,
    pub new_test_defaults_folder: Option<PathBuf>,
    pub report_exe: PathBuf,
    pub api_version: String,
    pub log_level: String,
    pub cors_origins: String,
    pub debug: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            profile_folder: PathBuf::from(DEFAULT_PROFILE_FOLDER),
            report_folder: PathBuf::from(DEFAULT_REPORT_FOLDER),
            data_folder: None,
            new_test_defaults_folder: None,
            report_exe: PathBuf::from(DEFAULT_REPORT_EXE),
            api_version: DEFAULT_API_VERSION.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS.to_string(),
            debug: false,
        }
    }
}

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub profile_folder: Option<PathBuf>,
    pub report_folder: Option<PathBuf>,
    pub data_folder: Option<PathBuf>,
    pub new_test_defaults_folder: Option<PathBuf>,
    pub report_exe: Option<PathBuf>,
    pub log_level: Option<String>,
    pub debug: Option<bool>,
}

/// On-disk TOML layout (`vv-api.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub profile_folder: Option<PathBuf>,
    pub report_folder: Option<PathBuf>,
    pub data_folder: Option<PathBuf>,
    pub new_test_defaults_folder: Option<PathBuf>,
    pub report_exe: Option<PathBuf>,
    pub api_version: Option<String>,
    pub log_level: Option<String>,
    pub cors_origins: Option<String>,
    pub debug: Option<bool>,
}

impl TomlConfig {
    /// Load the TOML file; a missing or unparsable file yields empty values.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Config file {} not readable ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(config) => {
                debug!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                warn!("Config file {} is not valid TOML ({}), ignoring it", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Default config file location: `<config dir>/vibrationview/vv-api.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vibrationview").join("vv-api.toml"))
}

impl ServiceConfig {
    /// Resolve every field from CLI, environment, TOML file, then defaults.
    ///
    /// `config_file` overrides the default file location. An invalid value in
    /// an environment variable is an error; a bad config file is not.
    pub fn resolve(cli: &ConfigOverrides, config_file: Option<&Path>) -> Result<Self> {
        let file = match config_file.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) if path.exists() || config_file.is_some() => TomlConfig::load(&path),
            _ => TomlConfig::default(),
        };
        Self::resolve_with(cli, file)
    }

    /// Resolution against an already-loaded TOML layer
    pub fn resolve_with(cli: &ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let port = match cli.port {
            Some(port) => port,
            None => match env_var("VV_PORT") {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| Error::Config(format!("VV_PORT must be a port number, got '{}'", raw)))?,
                None => file.port.unwrap_or(defaults.port),
            },
        };

        let debug = match cli.debug {
            Some(debug) => debug,
            None => match env_var("VV_DEBUG") {
                Some(raw) => parse_bool(&raw)
                    .ok_or_else(|| Error::Config(format!("VV_DEBUG must be true or false, got '{}'", raw)))?,
                None => file.debug.unwrap_or(defaults.debug),
            },
        };

        Ok(Self {
            host: pick(cli.host.clone(), "VV_HOST", file.host).unwrap_or(defaults.host),
            port,
            profile_folder: pick_path(cli.profile_folder.clone(), "VV_PROFILE_FOLDER", file.profile_folder)
                .unwrap_or(defaults.profile_folder),
            report_folder: pick_path(cli.report_folder.clone(), "VV_REPORT_FOLDER", file.report_folder)
                .unwrap_or(defaults.report_folder),
            data_folder: pick_path(cli.data_folder.clone(), "VV_DATA_FOLDER", file.data_folder),
            new_test_defaults_folder: pick_path(
                cli.new_test_defaults_folder.clone(),
                "VV_NEW_TEST_DEFAULTS_FOLDER",
                file.new_test_defaults_folder,
            ),
            report_exe: pick_path(cli.report_exe.clone(), "VV_REPORT_EXE", file.report_exe)
                .unwrap_or(defaults.report_exe),
            api_version: pick(None, "API_VERSION", file.api_version).unwrap_or(defaults.api_version),
            log_level: pick(cli.log_level.clone(), "LOG_LEVEL", file.log_level).unwrap_or(defaults.log_level),
            cors_origins: pick(None, "CORS_ORIGINS", file.cors_origins).unwrap_or(defaults.cors_origins),
            debug,
        })
    }

    /// Folders that data-file, report and upload paths must stay inside
    pub fn path_policy(&self) -> PathPolicy {
        let mut extra = vec![self.profile_folder.clone()];
        extra.extend(self.data_folder.clone());
        PathPolicy::new(self.report_folder.clone(), extra)
    }

    /// Where uploaded test profiles are written
    pub fn upload_folder(&self) -> PathBuf {
        self.profile_folder.join("Uploads")
    }

    /// Where generated reports are written before being returned
    pub fn temporary_report_folder(&self) -> PathBuf {
        self.report_folder.join("Temporary")
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn pick(cli: Option<String>, env_name: &str, file: Option<String>) -> Option<String> {
    cli.or_else(|| env_var(env_name)).or(file)
}

fn pick_path(cli: Option<PathBuf>, env_name: &str, file: Option<PathBuf>) -> Option<PathBuf> {
    cli.or_else(|| env_var(env_name).map(PathBuf::from)).or(file)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
