//! Error types for the relay process
//!
//! Two tiers: transport-fatal errors abort startup before the loop runs;
//! per-message faults are converted into `RelayError`, logged, and the
//! message is failed — they never terminate the consumption loop.

use thiserror::Error;

/// Process-level error taxonomy
#[derive(Error, Debug)]
pub enum RelayError {
    /// Inbound/outbound channel failure
    #[error("Transport error: {0}")]
    #[allow(dead_code)] // Reserved for broker-backed transports
    Transport(#[from] crate::transport::TransportError),

    /// Dispatch issuance failed
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] crate::caller::DispatchError),

    /// A panic was caught at the per-message fault boundary
    #[error("Message processing panicked: {0}")]
    Panic(String),

    /// Internal error (catch-all for unexpected errors)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
