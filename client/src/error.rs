//! Error types for the FitLoop client.
//!
//! One enum per layer, from the leaves up:
//!
//! - [`ValidationError`] - Local pre-flight checks on selected files
//! - [`TransportError`] - HTTP transport failures
//! - [`WorkflowError`] - Upload/process workflow failures
//! - [`DetailLoadError`] - Product detail fetch failures
//! - [`SaveError`] / [`ExportError`] - Report export failures
//! - [`ClientError`] - Top-level aggregate used by the CLI
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::time::Duration;

use thiserror::Error;

use crate::types::{Dataset, Route};

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No file selected for a dataset.
    #[error("{dataset} file is required")]
    MissingFile { dataset: Dataset },

    /// Selected file does not carry a `.csv` suffix.
    #[error("{dataset} file must be a CSV (got '{name}')")]
    NotCsv { dataset: Dataset, name: String },
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors from the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection or I/O failure before a status was received.
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Request was cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// Base URL and endpoint do not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response could not be decoded into the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status reported by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Decode(e.to_string())
    }
}

// =============================================================================
// Workflow Errors
// =============================================================================

/// Errors from the dataset upload workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A selected file failed local validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The upload or process call failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Another call is still in flight.
    #[error("Cannot {action} while {state}")]
    Busy { action: &'static str, state: &'static str },

    /// The action is not reachable from the current state.
    #[error("Cannot {action} from state '{state}'")]
    NotReady { action: &'static str, state: &'static str },

    /// The file selection changed while the call was in flight.
    #[error("{action} result discarded: selection changed while in flight")]
    Superseded { action: &'static str },
}

// =============================================================================
// View Errors
// =============================================================================

/// Failure to load a product for the detail view.
///
/// The detail view never renders a partial product, so the caller is
/// expected to navigate to [`DetailLoadError::fallback_route`].
#[derive(Debug, Error)]
#[error("Failed to load product '{product_id}': {source}")]
pub struct DetailLoadError {
    pub product_id: String,
    #[source]
    pub source: TransportError,
}

impl DetailLoadError {
    /// Where the caller should navigate after a failed load.
    pub fn fallback_route(&self) -> Route {
        Route::Collection
    }
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors from a [`crate::ReportSink`].
#[derive(Debug, Error)]
pub enum SaveError {
    /// Failed to write the report.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// The sink refused the filename.
    #[error("Invalid report filename: {0}")]
    InvalidName(String),
}

/// Errors from the export action.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export request failed.
    #[error("Export request failed: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with something other than a report payload.
    #[error("Expected a report payload, got {0}")]
    UnexpectedPayload(&'static str),

    /// The report could not be saved.
    #[error("{0}")]
    Save(#[from] SaveError),
}

// =============================================================================
// Client Errors (top-level)
// =============================================================================

/// Top-level error used by the CLI.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Workflow(#[from] WorkflowError),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Detail(#[from] DetailLoadError),

    #[error("{0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for CLI operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ValidationError -> WorkflowError
        let err: WorkflowError = ValidationError::MissingFile {
            dataset: Dataset::Reviews,
        }
        .into();
        assert!(err.to_string().contains("Reviews"));

        // TransportError -> ExportError -> ClientError
        let export: ExportError = TransportError::Status {
            status: 404,
            body: "Product not found".into(),
        }
        .into();
        let client: ClientError = export.into();
        assert!(client.to_string().contains("404"));
    }

    #[test]
    fn test_status_accessor() {
        let err = TransportError::Status {
            status: 401,
            body: "Invalid authentication token".into(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "HTTP 401: Invalid authentication token");
        assert_eq!(TransportError::Cancelled.status(), None);
    }

    #[test]
    fn test_detail_error_falls_back_to_collection() {
        let err = DetailLoadError {
            product_id: "SKU-9".into(),
            source: TransportError::Network("connection refused".into()),
        };
        assert_eq!(err.fallback_route(), Route::Collection);
        assert!(err.to_string().contains("SKU-9"));
    }
}
