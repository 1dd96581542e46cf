//! Wire records for the log-driver plugin protocol.
//!
//! These types mirror the daemon's JSON schema exactly: field names are
//! PascalCase with `ID` kept upper-case (`ContainerID`), and timestamps are
//! RFC 3339.  They form the data model shared by the [`crate::driver`] trait,
//! the dispatch handler, and the transport layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Container metadata
// ---------------------------------------------------------------------------

/// Metadata the daemon attaches to every logging request for a container.
///
/// Only the container ID is guaranteed to be present; every other field is
/// populated opportunistically by the daemon and defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInfo {
    /// Driver options from `--log-opt`, keyed by option name.
    #[serde(default)]
    pub config: HashMap<String, String>,
    /// Full ID of the container being logged.
    #[serde(rename = "ContainerID")]
    pub container_id: String,
    /// Name of the container, including the leading slash.
    #[serde(default)]
    pub container_name: String,
    /// Entrypoint the container was started with.
    #[serde(default)]
    pub container_entrypoint: String,
    /// Arguments passed to the entrypoint.
    #[serde(default)]
    pub container_args: Vec<String>,
    /// ID of the image the container was created from.
    #[serde(rename = "ContainerImageID", default)]
    pub container_image_id: String,
    /// Name of the image the container was created from.
    #[serde(default)]
    pub container_image_name: String,
    /// Creation time of the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_created: Option<DateTime<Utc>>,
    /// Environment of the container, as `KEY=value` strings.
    #[serde(default)]
    pub container_env: Vec<String>,
    /// Labels set on the container.
    #[serde(default)]
    pub container_labels: HashMap<String, String>,
    /// Path the daemon would have written container logs to.
    #[serde(default)]
    pub log_path: String,
    /// Name of the daemon issuing the request.
    #[serde(default)]
    pub daemon_name: String,
}

impl ContainerInfo {
    /// Look up a `--log-opt` driver option by name.
    pub fn opt(&self, name: &str) -> Option<&str> {
        self.config.get(name).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request to begin capturing a container's log stream.
///
/// `file` names a FIFO the daemon writes the container's stdio stream into;
/// the driver is expected to open it and consume until EOF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartLoggingRequest {
    /// Path to the log stream FIFO.
    pub file: String,
    /// Metadata for the container being logged.
    pub info: ContainerInfo,
}

/// Request to stop capturing the stream previously started for `file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopLoggingRequest {
    /// Path of the FIFO passed to the matching start request.
    pub file: String,
}

/// Options the daemon forwards from `docker logs` invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReadConfig {
    /// Only return messages logged at or after this time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Only return messages logged before this time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    /// Number of trailing messages to return; `0` means all.
    #[serde(default)]
    pub tail: i64,
    /// Whether the caller requested a following read.
    #[serde(default)]
    pub follow: bool,
}

/// Request to read back logs previously captured for a container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReadLogsRequest {
    /// Reader options from the `docker logs` invocation.
    #[serde(default)]
    pub read_config: ReadConfig,
    /// Metadata for the container whose logs are requested.
    pub info: ContainerInfo,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// One decoded log line, as returned by a read-logs request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogMessage {
    /// The log line, without a trailing newline.
    pub line: String,
    /// Stream the line was read from, `"stdout"` or `"stderr"`.
    pub source: String,
    /// Time the line was logged.
    pub timestamp: DateTime<Utc>,
    /// Set when the line is a fragment of a longer message.
    #[serde(default)]
    pub partial: bool,
}

/// Capabilities a log driver advertises to the daemon.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    /// Whether the driver can serve read-logs requests.
    pub read_logs: bool,
}

/// Payload of the plugin activation handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginManifest {
    /// Plugin protocol subsystems this plugin implements.
    pub implements: Vec<String>,
}

impl PluginManifest {
    /// Return `true` if the manifest advertises the log-driver subsystem.
    pub fn implements_log_driver(&self) -> bool {
        self.implements.iter().any(|s| s == "LogDriver")
    }
}
