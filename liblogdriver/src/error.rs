//! Log-driver error types.
//!
//! All errors in the `liblogdriver` crate are represented by the
//! [`LogDriverError`] enum, which derives [`thiserror::Error`] for ergonomic
//! error handling.  On the wire a driver failure is flattened into the
//! [`ErrorResponse`] payload the daemon understands: `{"Err": <message>}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for log-driver operations.
#[derive(Debug, Error)]
pub enum LogDriverError {
    /// A logging stream is already registered for the given FIFO.
    #[error("logging already started for {0}")]
    AlreadyLogging(String),

    /// No logging stream is registered for the given FIFO.
    #[error("no logging stream registered for {0}")]
    StreamNotFound(String),

    /// The driver does not support reading logs back.
    #[error("log reading is not supported by this driver")]
    ReadLogsUnsupported,

    /// A failure reported by the driver implementation.
    #[error("driver error: {0}")]
    DriverError(String),

    /// A socket or HTTP-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The caller supplied an invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An unclassified internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LogDriverError {
    /// Create a [`LogDriverError::DriverError`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn driver<E: std::fmt::Display>(e: E) -> Self {
        Self::DriverError(e.to_string())
    }

    /// Create a [`LogDriverError::TransportError`] from anything that
    /// implements [`std::fmt::Display`].
    pub fn transport<E: std::fmt::Display>(e: E) -> Self {
        Self::TransportError(e.to_string())
    }

    /// Create a [`LogDriverError::Internal`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Error payload in the shape the daemon understands.
///
/// The daemon distinguishes success from failure by payload shape, not by
/// status code: a response body whose `Err` field is non-empty is a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure message.
    #[serde(rename = "Err", default)]
    pub err: String,
}

impl ErrorResponse {
    /// Create an [`ErrorResponse`] with the provided message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self { err: msg.into() }
    }
}

impl From<&LogDriverError> for ErrorResponse {
    fn from(e: &LogDriverError) -> Self {
        Self::new(e.to_string())
    }
}
