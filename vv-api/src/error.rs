//! Error types for vv-api
//!
//! Every failure leaves the service as
//! `{success: false, error: {code, message, details?}, timestamp}` with the
//! status code of its category.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};
use vv_common::error_codes;

use crate::vendor::VendorError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input value (400)
    #[error("{0}")]
    InvalidParameter(String),

    /// Required parameter absent (400)
    #[error("{0}")]
    MissingParameter(String),

    /// Missing filename or disallowed extension (400)
    #[error("{0}")]
    InvalidFile(String),

    /// Raw upload without Content-Length (411)
    #[error("{0}")]
    LengthRequired(String),

    /// Upload over the size ceiling (413)
    #[error("{0}")]
    FileTooLarge(String),

    /// Path outside the authorized folders (403)
    #[error("{0}")]
    PathValidation(String),

    /// Missing file or out-of-range index (404)
    #[error("{0}")]
    NotFound(String),

    /// Vendor call or report subprocess failed (500)
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<Value>,
    },

    /// Vendor session could not be opened (503)
    #[error("{0}")]
    Connection(String),

    /// Anything else (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream {
            message: message.into(),
            details: None,
        }
    }

    /// Vendor failure with a caller-specific lead-in; the decoded scode goes in `details`
    pub fn vendor(context: impl std::fmt::Display, err: VendorError) -> Self {
        ApiError::Upstream {
            message: format!("{}: {}", context, err.message),
            details: err
                .scode
                .map(|scode| json!({ "com_error": error_codes::error_info(scode) })),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter(_) | ApiError::MissingParameter(_) | ApiError::InvalidFile(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::LengthRequired(_) => StatusCode::LENGTH_REQUIRED,
            ApiError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::PathValidation(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidParameter(_) => "INVALID_PARAMETER",
            ApiError::MissingParameter(_) => "MISSING_PARAMETER",
            ApiError::InvalidFile(_) => "INVALID_FILE",
            ApiError::LengthRequired(_) => "LENGTH_REQUIRED",
            ApiError::FileTooLarge(_) => "FILE_TOO_LARGE",
            ApiError::PathValidation(_) => "PATH_VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Upstream { .. } => "UPSTREAM_FAILURE",
            ApiError::Connection(_) => "CONNECTION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<vv_common::Error> for ApiError {
    fn from(err: vv_common::Error) -> Self {
        match err {
            vv_common::Error::InvalidParameter(msg) => ApiError::InvalidParameter(msg),
            vv_common::Error::PathValidation(msg) => ApiError::PathValidation(msg),
            vv_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<VendorError> for ApiError {
    fn from(err: VendorError) -> Self {
        ApiError::vendor("VibrationVIEW error", err)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(format!("IO error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            error!(code, "{}", self);
        } else {
            warn!(code, "{}", self);
        }

        let (message, details) = match self {
            ApiError::Upstream { message, details } => (message, details),
            other => (other.to_string(), None),
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        let body = Json(json!({
            "success": false,
            "error": error,
            "timestamp": crate::response::timestamp(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_category() {
        let cases = [
            (ApiError::InvalidParameter("x".into()), StatusCode::BAD_REQUEST, "INVALID_PARAMETER"),
            (ApiError::MissingParameter("x".into()), StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            (ApiError::InvalidFile("x".into()), StatusCode::BAD_REQUEST, "INVALID_FILE"),
            (ApiError::LengthRequired("x".into()), StatusCode::LENGTH_REQUIRED, "LENGTH_REQUIRED"),
            (ApiError::FileTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
            (ApiError::PathValidation("x".into()), StatusCode::FORBIDDEN, "PATH_VALIDATION_ERROR"),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ApiError::upstream("x"), StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_FAILURE"),
            (ApiError::Connection("x".into()), StatusCode::SERVICE_UNAVAILABLE, "CONNECTION_ERROR"),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn common_errors_keep_their_category() {
        let err: ApiError = vv_common::Error::InvalidParameter("Channel parameter must be >= 1".into()).into();
        assert_eq!(err.code(), "INVALID_PARAMETER");

        let err: ApiError = vv_common::Error::PathValidation("outside".into()).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err: ApiError = vv_common::Error::Config("bad".into()).into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn vendor_error_carries_decoded_scode() {
        let err: ApiError = VendorError::with_scode("Test not found", error_codes::VVIEW_E_TEST_NOT_FOUND).into();
        match err {
            ApiError::Upstream { message, details } => {
                assert_eq!(message, "VibrationVIEW error: Test not found");
                let details = details.unwrap();
                assert_eq!(details["com_error"]["name"], "Test not found");
                assert_eq!(details["com_error"]["code"], error_codes::VVIEW_E_TEST_NOT_FOUND);
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
