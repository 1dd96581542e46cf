//! Plugin socket location configuration.
//!
//! Environment variables:
//! - `DOCKER_PLUGIN_SOCK_DIR`: overrides the directory plugin sockets are
//!   created in. Defaults to `/run/docker/plugins`, where the daemon
//!   discovers plugins by socket name.

use std::path::PathBuf;
use std::sync::LazyLock;

/// Directory the daemon scans for plugin sockets, read from the environment
/// at first access.
pub static PLUGIN_SOCK_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    std::env::var("DOCKER_PLUGIN_SOCK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/run/docker/plugins"))
});
