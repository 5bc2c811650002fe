//! Common error types for the VibrationVIEW REST service

use thiserror::Error;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the service crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("{0}")]
    InvalidParameter(String),

    /// File path rejected by path validation
    #[error("{0}")]
    PathValidation(String),

    /// Requested resource not found
    #[error("{0}")]
    NotFound(String),
}
