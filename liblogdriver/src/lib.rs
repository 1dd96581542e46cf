//! # liblogdriver — Docker log-driver plugin adapter
//!
//! `liblogdriver` implements the HTTP side of the Docker [log-driver plugin
//! protocol][logdriver]: a small set of fixed RPC routes that the container
//! runtime daemon invokes on an external plugin process.  A plugin supplies a
//! [`LogDriver`] implementation; the adapter decodes the daemon's requests,
//! forwards them to the driver, and re-encodes results or errors into the
//! wire format the daemon expects (Tokio async runtime, `tracing` for
//! observability, `thiserror` for structured errors).
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Wire records: requests, container metadata, log messages, capabilities. |
//! | [`error`] | [`LogDriverError`] enum and the `{"Err": ...}` error payload. |
//! | [`driver`] | [`LogDriver`] trait — the plugin's extension point. |
//! | [`handler`] | Fixed route table and request dispatch. |
//! | [`transport`] | HTTP/1.1 server and client over Unix sockets or TCP. |
//! | [`config`] | Plugin socket directory resolution. |
//!
//! [logdriver]: https://docs.docker.com/engine/extend/plugins_logging/

pub mod config;
pub mod driver;
pub mod error;
pub mod handler;
pub mod transport;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use driver::LogDriver;
pub use error::{ErrorResponse, LogDriverError};
pub use handler::PluginHandler;
pub use transport::client::PluginClient;
pub use transport::server::PluginServer;
pub use types::*;
