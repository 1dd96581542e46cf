//! HTTP/1.1 listener that serves the plugin routes over a Unix socket or TCP
//! and dispatches each request through [`PluginHandler`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hyper::server::conn::Http;
use hyper::service::service_fn;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, UnixListener};
use tracing::{debug, info, warn};

use crate::config::PLUGIN_SOCK_DIR;
use crate::driver::LogDriver;
use crate::error::LogDriverError;
use crate::handler::PluginHandler;

enum PluginListener {
    Unix(UnixListener),
    Tcp(TcpListener),
}

/// A plugin server that accepts daemon connections and serves the log-driver
/// routes with a [`LogDriver`] implementation.
pub struct PluginServer<D> {
    listener: PluginListener,
    handler: Arc<PluginHandler<D>>,
    /// Set for Unix listeners; the socket file is unlinked on drop.
    socket_path: Option<PathBuf>,
}

impl<D> PluginServer<D>
where
    D: LogDriver + 'static,
{
    /// Bind a Unix socket at `path`, unlinking any stale socket left behind
    /// by a previous run.
    pub fn unix(path: impl AsRef<Path>, driver: D) -> Result<Self, LogDriverError> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| {
                LogDriverError::TransportError(format!(
                    "remove stale socket {}: {e}",
                    path.display()
                ))
            })?;
        }
        let listener = UnixListener::bind(path).map_err(|e| {
            LogDriverError::TransportError(format!("bind {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "log-driver plugin listening");
        Ok(Self {
            listener: PluginListener::Unix(listener),
            handler: Arc::new(PluginHandler::new(driver)),
            socket_path: Some(path.to_owned()),
        })
    }

    /// Bind the conventional socket for a plugin named `name`:
    /// `<socket dir>/<name>.sock`, creating the directory if needed.
    ///
    /// The socket directory is `/run/docker/plugins` unless overridden via
    /// the `DOCKER_PLUGIN_SOCK_DIR` environment variable.
    pub fn for_plugin(name: &str, driver: D) -> Result<Self, LogDriverError> {
        let dir = &*PLUGIN_SOCK_DIR;
        std::fs::create_dir_all(dir).map_err(|e| {
            LogDriverError::TransportError(format!("create {}: {e}", dir.display()))
        })?;
        Self::unix(dir.join(format!("{name}.sock")), driver)
    }

    /// Bind a TCP listener at `addr`.
    pub async fn tcp(addr: SocketAddr, driver: D) -> Result<Self, LogDriverError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| LogDriverError::TransportError(format!("bind {addr}: {e}")))?;
        info!(%addr, "log-driver plugin listening");
        Ok(Self {
            listener: PluginListener::Tcp(listener),
            handler: Arc::new(PluginHandler::new(driver)),
            socket_path: None,
        })
    }

    /// Local address of the TCP listener, useful after binding port 0.
    /// `None` for Unix listeners.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.listener {
            PluginListener::Tcp(l) => l.local_addr().ok(),
            PluginListener::Unix(_) => None,
        }
    }

    /// Accept connections until the task is dropped, serving each connection
    /// concurrently on its own Tokio task.
    ///
    /// Accept failures are logged and the loop continues; a single bad
    /// connection must not take the plugin down.
    pub async fn serve(&self) -> Result<(), LogDriverError> {
        loop {
            match &self.listener {
                PluginListener::Unix(l) => match l.accept().await {
                    Ok((stream, _)) => {
                        debug!("plugin connection accepted");
                        self.spawn_connection(stream);
                    }
                    Err(e) => warn!(error = %e, "plugin accept error"),
                },
                PluginListener::Tcp(l) => match l.accept().await {
                    Ok((stream, remote)) => {
                        debug!(%remote, "plugin connection accepted");
                        self.spawn_connection(stream);
                    }
                    Err(e) => warn!(error = %e, "plugin accept error"),
                },
            }
        }
    }

    /// Serve a single accepted connection with HTTP/1.1.
    fn spawn_connection<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let handler = Arc::clone(&handler);
                async move { Ok::<_, Infallible>(handler.handle(req).await) }
            });
            if let Err(e) = Http::new().serve_connection(stream, service).await {
                warn!(error = %e, "plugin connection error");
            }
        });
    }
}

impl<D> Drop for PluginServer<D> {
    fn drop(&mut self) {
        if let Some(path) = &self.socket_path
            && let Err(e) = std::fs::remove_file(path)
        {
            debug!(path = %path.display(), error = %e, "failed to remove plugin socket");
        }
    }
}
