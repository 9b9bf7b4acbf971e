//! Error types for playlist-dl
//!
//! This module provides comprehensive error handling for the library, including:
//! - Domain-specific error types (Client, Transfer, Database, etc.)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for playlist-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for playlist-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Streaming-service client error (metadata fetch, search, auth)
    #[error("client error: {0}")]
    Client(String),

    /// Item is not available for streaming on the given source
    ///
    /// The field is `source_name` rather than `source` because thiserror
    /// reserves `source` for the error-chain cause.
    #[error("item {id} not streamable on {source_name}: {reason}")]
    NotStreamable {
        /// The item ID that cannot be streamed
        id: String,
        /// The streaming source that rejected the item
        source_name: String,
        /// The reason reported by the client
        reason: String,
    },

    /// Byte-transfer error during download
    #[error("transfer error: {0}")]
    Transfer(String),

    /// External playlist page could not be scraped
    #[error("scrape error: {0}")]
    Scrape(String),

    /// Post-processing error (tagging, conversion)
    #[error("post-processing error: {0}")]
    PostProcess(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request from an API consumer (bad URL, unknown source name)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "task abc123 not found",
///     "details": {
///       "task_id": "abc123"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 422 Unprocessable Entity - Semantic errors
            Error::NotStreamable { .. } => 422,
            Error::PostProcess(_) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Client(_) => 502,
            Error::Transfer(_) => 502,
            Error::Scrape(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Client(_) => "client_error",
            Error::NotStreamable { .. } => "not_streamable",
            Error::Transfer(_) => "transfer_error",
            Error::Scrape(_) => "scrape_error",
            Error::PostProcess(_) => "post_process_error",
            Error::Io(_) => "io_error",
            Error::NotFound(_) => "not_found",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::NotStreamable {
                id, source_name, ..
            } => Some(serde_json::json!({
                "item_id": id,
                "source": source_name,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("download_dir".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::InvalidRequest("unknown source 'tidal'".into()),
                400,
                "invalid_request",
            ),
            (Error::NotFound("task abc".into()), 404, "not_found"),
            (
                Error::NotStreamable {
                    id: "trk1".into(),
                    source_name: "qobuz".into(),
                    reason: "region locked".into(),
                },
                422,
                "not_streamable",
            ),
            (
                Error::PostProcess("tagging failed".into()),
                422,
                "post_process_error",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("timeout".into())),
                500,
                "database_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
            (
                Error::Client("metadata fetch failed".into()),
                502,
                "client_error",
            ),
            (
                Error::Transfer("connection reset".into()),
                502,
                "transfer_error",
            ),
            (
                Error::Scrape("playlist title not found".into()),
                502,
                "scrape_error",
            ),
        ]
    }

    #[test]
    fn test_status_codes_for_all_variants() {
        for (error, expected_status, code) in all_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "wrong status for {code}"
            );
        }
    }

    #[test]
    fn test_error_codes_for_all_variants() {
        for (error, _, expected_code) in all_variants() {
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[test]
    fn test_error_to_api_error_not_streamable_details() {
        let error = Error::NotStreamable {
            id: "trk42".into(),
            source_name: "qobuz".into(),
            reason: "removed from catalog".into(),
        };
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "not_streamable");
        assert!(api_error.error.message.contains("trk42"));

        let details = api_error.error.details.unwrap();
        assert_eq!(details["item_id"], "trk42");
        assert_eq!(details["source"], "qobuz");
    }

    #[test]
    fn test_error_to_api_error_config_key_detail() {
        let error = Error::Config {
            message: "must be at least 1".into(),
            key: Some("max_concurrent_downloads".into()),
        };
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "config_error");
        assert_eq!(
            api_error.error.details.unwrap()["key"],
            "max_concurrent_downloads"
        );
    }

    #[test]
    fn test_error_to_api_error_without_details() {
        let error = Error::Transfer("timeout".into());
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "transfer_error");
        assert!(api_error.error.details.is_none());
    }

    #[test]
    fn test_api_error_factories() {
        let not_found = ApiError::not_found("task abc123");
        assert_eq!(not_found.error.code, "not_found");
        assert_eq!(not_found.error.message, "task abc123 not found");

        let validation = ApiError::validation("url is required");
        assert_eq!(validation.error.code, "validation_error");

        let internal = ApiError::internal("oops");
        assert_eq!(internal.error.code, "internal_error");
    }

    #[test]
    fn test_api_error_json_omits_empty_details() {
        let api_error = ApiError::new("test_code", "test message");

        let json = serde_json::to_value(&api_error).unwrap();
        assert_eq!(json["error"]["code"], "test_code");
        assert_eq!(json["error"]["message"], "test message");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_api_error_message_matches_display() {
        let error = Error::NotStreamable {
            id: "t1".into(),
            source_name: "deezer".into(),
            reason: "geo restriction".into(),
        };
        let display = error.to_string();
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.message, display);
    }
}
