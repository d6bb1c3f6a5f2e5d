//! Dispatch-specific error types
//!
//! Errors from issuing and performing ERP read calls. Failures of an
//! individual sub-resource call stay inside that call's task; these types
//! give them structure for logging.

use thiserror::Error;

/// Errors that can occur while performing an ERP read call
#[derive(Error, Debug)]
pub enum DispatchError {
    /// HTTP request could not be sent or completed
    #[error("ERP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ERP API answered with a non-success status
    #[error("ERP returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, best-effort
        body: String,
    },

    /// Response body was not valid JSON
    #[error("Failed to parse ERP response: {0}")]
    Parse(#[from] serde_json::Error),
}
