//! HTTP transport for the plugin protocol.
//!
//! This module provides [`server::PluginServer`] and [`client::PluginClient`]
//! that exchange the fixed plugin routes over a Unix socket (the normal
//! deployment) or TCP.

pub mod client;
pub mod server;
