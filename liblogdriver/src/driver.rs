//! The log-driver trait a plugin implements.
//!
//! The daemon drives a plugin through four operations:
//!
//! 1. **StartLogging** — begin consuming a container's log stream.
//! 2. **StopLogging** — stop consuming a previously started stream.
//! 3. **ReadLogs** — return captured log lines for a container.
//! 4. **Capabilities** — advertise whether ReadLogs is supported.

use async_trait::async_trait;

use crate::error::LogDriverError;
use crate::types::{
    CapabilitiesResponse, LogMessage, ReadLogsRequest, StartLoggingRequest, StopLoggingRequest,
};

/// The interface a log driver must fulfill.
///
/// Implementations are shared across request-handling tasks, so all methods
/// take `&self`; drivers keep per-stream state behind their own
/// synchronization.
#[async_trait]
pub trait LogDriver: Send + Sync {
    /// Begin capturing the log stream written to `req.file`.
    ///
    /// The FIFO stays open until the matching [`Self::stop_logging`] call;
    /// the driver is expected to consume it on a background task rather than
    /// block the request.
    async fn start_logging(&self, req: StartLoggingRequest) -> Result<(), LogDriverError>;

    /// Stop capturing the stream previously started for `req.file`.
    async fn stop_logging(&self, req: StopLoggingRequest) -> Result<(), LogDriverError>;

    /// Return captured log lines for the container in `req.info`, honoring
    /// the reader options in `req.read_config`.
    ///
    /// Drivers that do not retain logs return
    /// [`LogDriverError::ReadLogsUnsupported`] and advertise
    /// `read_logs: false` from [`Self::capabilities`].
    async fn read_logs(&self, req: ReadLogsRequest) -> Result<Vec<LogMessage>, LogDriverError>;

    /// Advertise the capabilities of this driver.
    async fn capabilities(&self) -> CapabilitiesResponse;
}
