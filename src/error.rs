//! Error types for the Dry Beans API.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant maps onto one HTTP status; variants that represent store or
//! connectivity failures are logged in full but rendered as an opaque message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::error;

/// Message returned to clients for every 5xx response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum BeanError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Bean not found")]
    NotFound { id: i64 },

    #[error("{message}")]
    Conflict { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BeanError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for a bean id.
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Replace the message of a conflict error, leaving other variants untouched.
    ///
    /// Uniqueness violations carry no context about the operation that hit
    /// them, so the store relabels them per operation.
    pub fn on_conflict(self, message: &str) -> Self {
        match self {
            Self::Conflict { .. } => Self::conflict(message),
            other => other,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database { .. }
            | Self::Connection { .. }
            | Self::Timeout { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to untrusted callers.
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Convert sqlx errors to BeanError.
///
/// Constraint violations are classified by the driver's structured error kind,
/// which sqlx derives from the SQLSTATE (PostgreSQL) or extended result code (SQLite).
impl From<sqlx::Error> for BeanError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                match db_err.kind() {
                    ErrorKind::UniqueViolation => BeanError::conflict("Duplicate bean"),
                    ErrorKind::NotNullViolation => BeanError::validation("Missing required field"),
                    ErrorKind::CheckViolation => {
                        BeanError::validation("Field value violates a table constraint")
                    }
                    _ => BeanError::database(db_err.message(), code),
                }
            }
            sqlx::Error::Configuration(msg) => BeanError::connection(
                msg.to_string(),
                "Check the connection settings and credentials",
            ),
            sqlx::Error::RowNotFound => BeanError::database("No rows returned", None),
            sqlx::Error::PoolTimedOut => BeanError::connection(
                "Timed out acquiring a pooled connection",
                "Raise --max-connections or --acquire-timeout, or check for slow queries",
            ),
            sqlx::Error::PoolClosed => {
                BeanError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => BeanError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => BeanError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => BeanError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                BeanError::database(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnDecode { index, source } => {
                BeanError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => BeanError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => BeanError::internal("Database worker crashed"),
            _ => BeanError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for bean operations.
pub type BeanResult<T> = Result<T, BeanError>;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Stable, human readable error message
    pub error: String,
}

impl IntoResponse for BeanError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                BeanError::Database { sql_state, .. } => {
                    error!(error = %self, sql_state = ?sql_state, "Request failed")
                }
                _ => error!(error = %self, suggestion = ?self.suggestion(), "Request failed"),
            }
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = BeanError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
        assert_eq!(BeanError::not_found(7).to_string(), "Bean not found");
    }

    #[test]
    fn test_error_suggestion() {
        let err = BeanError::connection("refused", "Start the server");
        assert_eq!(err.suggestion(), Some("Start the server"));
        assert_eq!(BeanError::validation("bad").suggestion(), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(BeanError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(BeanError::not_found(1).status(), StatusCode::NOT_FOUND);
        assert_eq!(BeanError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            BeanError::database("boom", Some("XX000".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BeanError::timeout("query", 30).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_on_conflict_only_relabels_conflicts() {
        let err = BeanError::conflict("Duplicate bean").on_conflict("Bean with this ID already exists");
        assert_eq!(err.to_string(), "Bean with this ID already exists");

        let err = BeanError::not_found(3).on_conflict("ignored");
        assert!(matches!(err, BeanError::NotFound { id: 3 }));
    }

    #[test]
    fn test_pool_timeout_is_internal() {
        let err = BeanError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, BeanError::Connection { .. }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_validation_response_keeps_message() {
        let response = BeanError::validation("area must be a number").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "area must be a number");
    }

    #[tokio::test]
    async fn test_internal_response_hides_details() {
        let response =
            BeanError::database("relation \"dry_beans\" does not exist", Some("42P01".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("dry_beans"));
    }
}
