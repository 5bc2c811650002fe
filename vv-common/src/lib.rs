//! # VibrationVIEW REST Common Library
//!
//! Shared code for the VibrationVIEW REST service:
//! - Error types
//! - Configuration resolution (CLI → ENV → TOML → compiled defaults)
//! - TEDS transducer metadata normalization
//! - 1-based → 0-based channel/loop index translation
//! - VibrationVIEW automation error codes
//! - Path validation for file operations

pub mod config;
pub mod error;
pub mod error_codes;
pub mod index;
pub mod paths;
pub mod teds;

pub use error::{Error, Result};
